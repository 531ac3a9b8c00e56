use serde::{Deserialize, Serialize};

use super::rider::RiderState;
use crate::sim::PhysicsParams;

/// Energy breakdown of the rider at one instant, in joules.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub kinetic: f64,
    pub potential: f64,
    pub thermal: f64,
    pub total: f64,
}

impl EnergySnapshot {
    /// Kinetic plus potential.
    pub fn mechanical(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// Derives energy values from rider state; holds no state of its own.
pub struct EnergyLedger;

impl EnergyLedger {
    pub fn snapshot(state: &RiderState, params: &PhysicsParams) -> EnergySnapshot {
        let kinetic = 0.5 * state.mass * state.velocity.magnitude_squared();
        let potential =
            state.mass * params.gravity * (state.position.y - params.reference_height);
        let thermal = state.thermal;
        EnergySnapshot {
            kinetic,
            potential,
            thermal,
            total: kinetic + potential + thermal,
        }
    }

    /// Zeroes the thermal accumulator and nothing else.
    pub fn clear_thermal(state: &mut RiderState) {
        state.thermal = 0.0;
    }
}
