//! Rider state and how it advances through time.
//!
//! [`integrator::advance`] is a pure function from one [`RiderState`] to the
//! next; [`SimulationClock`] decides how many fixed sub-steps a frame owes and
//! [`EnergyLedger`] derives energy values on demand.

mod clock;
mod energy;
mod integrator;
mod landing;
mod rider;

pub use clock::{ClockSettings, SimulationClock, SpeedFactor};
pub use energy::{EnergyLedger, EnergySnapshot};
pub use integrator::{advance, contact_forces, StepContext};
pub use landing::{detect as detect_landing, Landing};
pub use rider::{grounded_angle, Attachment, Motion, Regime, RiderState, Side};
