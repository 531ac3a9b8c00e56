use serde::{Deserialize, Serialize};

use super::arena::TrackId;
use crate::sim::Vector2;

/// Weak reference to one control point of a track in a [`TrackSet`](super::TrackSet).
///
/// Resolving it after the track was removed yields `None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointRef {
    pub track: TrackId,
    pub index: usize,
}

impl PointRef {
    pub const fn new(track: TrackId, index: usize) -> Self {
        Self { track, index }
    }
}

/// Editable track point. Owned by exactly one track.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlPoint {
    pub position: Vector2,
    /// End point of another track this point would join with.
    pub snap_target: Option<PointRef>,
}

impl ControlPoint {
    pub const fn new(position: Vector2) -> Self {
        Self {
            position,
            snap_target: None,
        }
    }

    pub fn with_position(&self, position: Vector2) -> Self {
        Self {
            position,
            snap_target: self.snap_target,
        }
    }

    pub fn with_snap_target(&self, snap_target: Option<PointRef>) -> Self {
        Self {
            position: self.position,
            snap_target,
        }
    }
}

impl From<Vector2> for ControlPoint {
    fn from(position: Vector2) -> Self {
        Self::new(position)
    }
}
