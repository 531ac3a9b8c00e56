//! Skatetrack - physics core for a rider moving on user-drawn tracks.
//!
//! # Architecture
//!
//! Layered modules with inward-only dependencies:
//!
//! - **sim**: Math and physics primitives (Vector2, Curvature, Forces, PhysicsParams)
//! - **track**: Control points, spline curves and the track arena
//! - **motion**: Rider state, sub-step integration, clock and energy ledger
//! - **scene**: The [`Simulation`] facade driven by user input and frame ticks
//!
//! # Usage
//!
//! ```ignore
//! use skatetrack::{Simulation, SimulationConfig};
//!
//! let mut sim = Simulation::new(SimulationConfig::default())?;
//! sim.play();
//! sim.tick(1.0 / 60.0);
//! let frame = sim.frame();
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod error;
pub mod motion;
pub mod scene;
pub mod sim;
pub mod track;

// Re-export commonly used types at crate root
pub use error::{ConfigError, StepError};
pub use motion::{EnergySnapshot, RiderState, SpeedFactor};
pub use scene::{RenderFrame, RiderSnapshot, Simulation, SimulationConfig};
pub use sim::{PhysicsParams, Vector2};
pub use track::{CurveFit, PointRef, TrackId, TrackPreset};
