use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::motion::{Attachment, EnergySnapshot, Motion, Regime, RiderState, Side, SpeedFactor};
use crate::sim::Vector2;
use crate::track::{Track, TrackId, TrackSet};

/// What the renderer needs to draw the rider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderView {
    pub position: Vector2,
    pub velocity: Vector2,
    pub angle: f64,
    pub mass: f64,
    pub regime: Regime,
    pub track: Option<TrackId>,
    pub side: Option<Side>,
    pub released: bool,
}

impl From<&RiderState> for RiderView {
    fn from(state: &RiderState) -> Self {
        let attachment = state.attachment();
        Self {
            position: state.position,
            velocity: state.velocity,
            angle: state.angle,
            mass: state.mass,
            regime: state.regime(),
            track: attachment.map(|a| a.track),
            side: attachment.map(|a| a.side),
            released: state.is_released(),
        }
    }
}

/// Control points plus drawable curve samples of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackView {
    pub id: TrackId,
    pub control_points: Vec<Vector2>,
    pub samples: Vec<Vector2>,
    pub interactive: bool,
    pub traversable: bool,
}

impl TrackView {
    pub fn new(id: TrackId, track: &Track, resolution: f64) -> Self {
        Self {
            id,
            control_points: track.positions(),
            samples: track.curve().resample(resolution),
            interactive: track.is_interactive(),
            traversable: track.is_traversable(),
        }
    }
}

/// Everything drawn for one frame. A copy; holds no references into the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub rider: RiderView,
    pub energy: EnergySnapshot,
    pub tracks: Vec<TrackView>,
    pub playing: bool,
    pub speed: SpeedFactor,
}

/// Plain-data copy of the rider for replay and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderSnapshot {
    pub mass: f64,
    pub regime: Regime,
    /// Present only for grounded riders.
    pub attachment: Option<Attachment>,
    pub position: Vector2,
    pub velocity: Vector2,
    pub angle: f64,
    pub thermal: f64,
}

impl From<&RiderState> for RiderSnapshot {
    fn from(state: &RiderState) -> Self {
        Self {
            mass: state.mass,
            regime: state.regime(),
            attachment: state.attachment(),
            position: state.position,
            velocity: state.velocity,
            angle: state.angle,
            thermal: state.thermal,
        }
    }
}

impl RiderSnapshot {
    /// Rebuilds the rider against `tracks`.
    ///
    /// Grounded snapshots re-derive position and velocity from the current
    /// curve, so a snapshot taken before a track edit lands on the edited
    /// curve at the same parameter.
    pub fn to_state(&self, tracks: &TrackSet) -> Result<RiderState, ConfigError> {
        let finite = self.mass.is_finite()
            && self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.thermal.is_finite();
        if !finite {
            return Err(ConfigError::NonFinite { field: "snapshot" });
        }
        if self.thermal < 0.0 {
            return Err(ConfigError::InvalidConfig {
                field: "thermal",
                reason: "must be >= 0",
            });
        }

        let motion = match (self.regime, self.attachment) {
            (Regime::Grounded, Some(attachment)) => {
                if !(attachment.u.is_finite() && attachment.speed.is_finite()) {
                    return Err(ConfigError::NonFinite { field: "attachment" });
                }
                let track = tracks.require(attachment.track)?;
                if !track.curve().contains_param(attachment.u) {
                    return Err(ConfigError::InvalidConfig {
                        field: "attachment",
                        reason: "path parameter outside track",
                    });
                }
                return Ok(RiderState::grounded(
                    self.mass,
                    track.curve(),
                    attachment,
                    self.thermal,
                ));
            }
            (Regime::Grounded, None) => {
                return Err(ConfigError::InvalidConfig {
                    field: "attachment",
                    reason: "grounded snapshot without attachment",
                })
            }
            (Regime::Airborne, _) => Motion::Airborne,
            (Regime::Dragged, _) => Motion::Dragged,
        };
        Ok(RiderState::new(
            self.mass,
            motion,
            self.position,
            self.velocity,
            self.angle,
            self.thermal,
        ))
    }
}
