use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::sim::{physics, Vector2};
use crate::track::{CurveFit, TrackId};

/// Which side of a curve the rider rides on, relative to the curve's left normal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// On the left-normal side (on top of a track drawn left to right).
    Positive,
    /// Opposite the left normal (underneath a track drawn left to right).
    Negative,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Positive => 1.0,
            Side::Negative => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Side::Positive => Side::Negative,
            Side::Negative => Side::Positive,
        }
    }

    /// `Positive` for non-negative values.
    pub fn from_sign(value: f64) -> Self {
        if value >= 0.0 {
            Side::Positive
        } else {
            Side::Negative
        }
    }
}

/// Where and how fast a grounded rider sits on its track.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub track: TrackId,
    /// Path parameter.
    pub u: f64,
    pub side: Side,
    /// Signed speed along the direction of increasing `u`, in m/s.
    pub speed: f64,
}

impl Attachment {
    pub const fn new(track: TrackId, u: f64, side: Side, speed: f64) -> Self {
        Self {
            track,
            u,
            side,
            speed,
        }
    }
}

/// Motion regime of the rider.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Grounded(Attachment),
    Airborne,
    /// Held by user input; not integrated.
    Dragged,
}

/// Regime tag without payload, for display and logging.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Grounded,
    Airborne,
    Dragged,
}

/// The rider at one instant.
///
/// While grounded, `position` and `velocity` are kept equal to the curve
/// point and tangent velocity implied by the attachment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RiderState {
    pub mass: f64,
    pub motion: Motion,
    pub position: Vector2,
    pub velocity: Vector2,
    /// Orientation in radians; 0 is upright.
    pub angle: f64,
    /// Cumulative energy dissipated by friction and impacts, in joules.
    pub thermal: f64,
}

impl RiderState {
    pub const fn new(
        mass: f64,
        motion: Motion,
        position: Vector2,
        velocity: Vector2,
        angle: f64,
        thermal: f64,
    ) -> Self {
        Self {
            mass,
            motion,
            position,
            velocity,
            angle,
            thermal,
        }
    }

    /// Airborne rider at rest at `position`.
    pub const fn at_rest(mass: f64, position: Vector2) -> Self {
        Self::new(mass, Motion::Airborne, position, Vector2::ZERO, 0.0, 0.0)
    }

    /// Rider attached to `curve` with position, velocity and angle derived from
    /// the attachment.
    pub fn grounded(mass: f64, curve: &CurveFit, attachment: Attachment, thermal: f64) -> Self {
        let tangent = curve.unit_tangent(attachment.u);
        Self::new(
            mass,
            Motion::Grounded(attachment),
            curve.position(attachment.u),
            tangent * attachment.speed,
            grounded_angle(tangent, attachment.side),
            thermal,
        )
    }

    pub fn attachment(&self) -> Option<Attachment> {
        match self.motion {
            Motion::Grounded(attachment) => Some(attachment),
            _ => None,
        }
    }

    pub fn regime(&self) -> Regime {
        match self.motion {
            Motion::Grounded(_) => Regime::Grounded,
            Motion::Airborne => Regime::Airborne,
            Motion::Dragged => Regime::Dragged,
        }
    }

    /// False only while the user holds the rider.
    pub fn is_released(&self) -> bool {
        !matches!(self.motion, Motion::Dragged)
    }

    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    pub fn with_mass(&self, mass: f64) -> Self {
        Self { mass, ..*self }
    }

    pub fn with_thermal(&self, thermal: f64) -> Self {
        Self { thermal, ..*self }
    }

    pub fn with_motion(&self, motion: Motion) -> Self {
        Self { motion, ..*self }
    }

    /// Airborne copy keeping position, velocity and angle.
    pub fn airborne(&self) -> Self {
        Self {
            motion: Motion::Airborne,
            ..*self
        }
    }

    /// Held by the user at `position`, at rest and upright.
    pub fn dragged_to(&self, position: Vector2) -> Self {
        Self::new(
            self.mass,
            Motion::Dragged,
            position,
            Vector2::ZERO,
            0.0,
            self.thermal,
        )
    }

    pub fn is_finite(&self) -> bool {
        let attachment_ok = match self.motion {
            Motion::Grounded(a) => a.u.is_finite() && a.speed.is_finite(),
            _ => true,
        };
        attachment_ok
            && self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.thermal.is_finite()
    }
}

/// Angle of a rider standing on the curve: along the tangent, flipped when
/// riding underneath.
pub fn grounded_angle(unit_tangent: Vector2, side: Side) -> f64 {
    let along = unit_tangent.angle();
    match side {
        Side::Positive => physics::wrap_angle(along),
        Side::Negative => physics::wrap_angle(along + PI),
    }
}
