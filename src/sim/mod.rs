//! Pure physics and math primitives.
//!
//! Nothing here knows about tracks or riders; these are the building blocks
//! the integrator and the curve code share.

mod curvature;
mod forces;
mod math;
mod physics_params;

pub mod physics;

pub use curvature::Curvature;
pub use forces::Forces;
pub use math::Vector2;
pub use physics::{wrap_angle, DT, EPSILON, G, HZ};
pub use physics_params::PhysicsParams;
