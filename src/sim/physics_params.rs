use serde::{Deserialize, Serialize};

use super::physics;
use crate::error::ConfigError;

/// World constants shared by the integrator and the energy ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Gravitational acceleration magnitude in m/s^2.
    pub gravity: f64,
    /// Kinetic and static friction coefficient between rider and track.
    pub friction: f64,
    /// Height at which potential energy is zero.
    pub reference_height: f64,
}

impl PhysicsParams {
    pub fn new(gravity: f64, friction: f64, reference_height: f64) -> Result<Self, ConfigError> {
        let params = Self {
            gravity,
            friction,
            reference_height,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(ConfigError::InvalidGravity(self.gravity));
        }
        if !(self.friction.is_finite() && self.friction >= 0.0) {
            return Err(ConfigError::InvalidFriction(self.friction));
        }
        if !self.reference_height.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "reference_height",
            });
        }
        Ok(())
    }

    pub fn with_friction(&self, friction: f64) -> Result<Self, ConfigError> {
        Self::new(self.gravity, friction, self.reference_height)
    }

    pub fn with_gravity(&self, gravity: f64) -> Result<Self, ConfigError> {
        Self::new(gravity, self.friction, self.reference_height)
    }

    pub fn with_reference_height(&self, reference_height: f64) -> Result<Self, ConfigError> {
        Self::new(self.gravity, self.friction, reference_height)
    }

    pub fn has_friction(&self) -> bool {
        self.friction > 0.0
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: physics::G,
            friction: 0.0,
            reference_height: 0.0,
        }
    }
}
