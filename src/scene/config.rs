use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::motion::ClockSettings;
use crate::sim::{PhysicsParams, Vector2};
use crate::track::{TrackLayout, TrackPreset};

/// Every tunable of a [`super::Simulation`], fixed at construction.
///
/// Missing fields fall back to their defaults when loading from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed integration sub-step, seconds.
    pub substep_dt: f64,
    /// Frame times above this are clamped before accumulating.
    pub max_frame_dt: f64,
    pub max_substeps_per_tick: usize,
    pub slow_speed_factor: f64,
    /// Simulated time advanced by one requested step while paused.
    pub step_frame_dt: f64,
    /// Height of the floor plane, m.
    pub ground_level: f64,
    /// Inclusive `[min, max]` rider mass, kg.
    pub mass_range: (f64, f64),
    /// Half-width of the curvature sample stencil, in path parameter units.
    pub curvature_epsilon: f64,
    /// Distance from a curve at which a falling rider counts as landed, m.
    pub landing_tolerance: f64,
    /// How close a released rider must be to a track to attach to it, m.
    pub attach_radius: f64,
    /// How close two track ends must be to snap together, m.
    pub snap_radius: f64,
    /// Spacing of curve samples handed to the renderer, m.
    pub sample_resolution: f64,
    pub physics: PhysicsParams,
    pub initial_mass: f64,
    /// Where the rider is released at start and after reset.
    pub initial_position: Vector2,
    pub tracks: Vec<TrackLayout>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let clock = ClockSettings::default();
        Self {
            substep_dt: clock.substep_dt,
            max_frame_dt: clock.max_frame_dt,
            max_substeps_per_tick: clock.max_substeps_per_tick,
            slow_speed_factor: clock.slow_speed_factor,
            step_frame_dt: clock.step_frame_dt,
            ground_level: 0.0,
            mass_range: (10.0, 100.0),
            curvature_epsilon: 1e-3,
            landing_tolerance: 1e-3,
            attach_radius: 0.5,
            snap_radius: 0.3,
            sample_resolution: 0.05,
            physics: PhysicsParams::default(),
            initial_mass: 60.0,
            initial_position: Vector2::new(-2.0, 1.0),
            tracks: vec![TrackPreset::Parabola.layout()],
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::InvalidConfig {
            field,
            reason: "must be > 0",
        });
    }
    Ok(())
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("substep_dt", self.substep_dt)?;
        positive("max_frame_dt", self.max_frame_dt)?;
        positive("slow_speed_factor", self.slow_speed_factor)?;
        positive("step_frame_dt", self.step_frame_dt)?;
        positive("curvature_epsilon", self.curvature_epsilon)?;
        positive("landing_tolerance", self.landing_tolerance)?;
        positive("attach_radius", self.attach_radius)?;
        positive("snap_radius", self.snap_radius)?;
        positive("sample_resolution", self.sample_resolution)?;
        if self.max_substeps_per_tick == 0 {
            return Err(ConfigError::InvalidConfig {
                field: "max_substeps_per_tick",
                reason: "must be at least 1",
            });
        }
        if !self.ground_level.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "ground_level",
            });
        }

        let (min, max) = self.mass_range;
        positive("mass_range", min)?;
        positive("mass_range", max)?;
        if min > max {
            return Err(ConfigError::InvalidConfig {
                field: "mass_range",
                reason: "min exceeds max",
            });
        }
        self.check_mass(self.initial_mass)?;

        self.physics.validate()?;
        if !self.initial_position.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "initial_position",
            });
        }
        if self.initial_position.y < self.ground_level {
            return Err(ConfigError::InvalidConfig {
                field: "initial_position",
                reason: "below ground",
            });
        }
        for layout in &self.tracks {
            if layout.points.len() < 2 {
                return Err(ConfigError::TooFewControlPoints {
                    count: layout.points.len(),
                });
            }
            if layout.points.iter().any(|p| p.y < self.ground_level) {
                return Err(ConfigError::InvalidConfig {
                    field: "tracks",
                    reason: "control point below ground",
                });
            }
        }
        Ok(())
    }

    /// Accepts `mass` only inside the configured range.
    pub fn check_mass(&self, mass: f64) -> Result<(), ConfigError> {
        let (min, max) = self.mass_range;
        if mass.is_finite() && (min..=max).contains(&mass) {
            Ok(())
        } else {
            Err(ConfigError::InvalidMass {
                value: mass,
                min,
                max,
            })
        }
    }

    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings {
            substep_dt: self.substep_dt,
            max_frame_dt: self.max_frame_dt,
            max_substeps_per_tick: self.max_substeps_per_tick,
            slow_speed_factor: self.slow_speed_factor,
            step_frame_dt: self.step_frame_dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "substep_dt": 0.002, "physics": { "friction": 0.3 } }"#)
                .unwrap();
        assert_eq!(config.substep_dt, 0.002);
        assert_eq!(config.physics.friction, 0.3);
        assert_eq!(config.physics.gravity, crate::sim::G);
        assert_eq!(config.initial_mass, 60.0);
        assert_eq!(config.tracks.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = SimulationConfig {
            substep_dt: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidConfig { field: "substep_dt", .. })
        ));

        let bad = SimulationConfig {
            initial_mass: 500.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidMass { .. })));

        let bad = SimulationConfig {
            max_substeps_per_tick: 0,
            ..SimulationConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = SimulationConfig {
            tracks: vec![TrackLayout::new(vec![Vector2::ZERO], true, true)],
            ..SimulationConfig::default()
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigError::TooFewControlPoints { count: 1 })
        );
    }

    #[test]
    fn rejects_anything_below_ground() {
        let buried = SimulationConfig {
            tracks: vec![TrackLayout::new(
                vec![Vector2::new(-2.0, 1.0), Vector2::new(0.0, -0.5), Vector2::new(2.0, 1.0)],
                true,
                true,
            )],
            ..SimulationConfig::default()
        };
        assert!(matches!(
            buried.validate(),
            Err(ConfigError::InvalidConfig { field: "tracks", .. })
        ));

        let raised = SimulationConfig {
            ground_level: 2.0,
            initial_position: Vector2::new(0.0, 3.0),
            ..SimulationConfig::default()
        };
        assert!(raised.validate().is_err(), "default parabola sits below a raised ground");

        let sunk = SimulationConfig {
            initial_position: Vector2::new(0.0, -1.0),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            sunk.validate(),
            Err(ConfigError::InvalidConfig { field: "initial_position", .. })
        ));
    }

    #[test]
    fn mass_range_is_inclusive() {
        let config = SimulationConfig::default();
        assert!(config.check_mass(10.0).is_ok());
        assert!(config.check_mass(100.0).is_ok());
        assert!(config.check_mass(9.99).is_err());
        assert!(config.check_mass(f64::NAN).is_err());
    }
}
