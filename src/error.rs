//! Error types for the physics core.
//!
//! Invalid input is rejected at the boundary with [`ConfigError`]; numeric
//! failures inside a single sub-step surface as [`StepError`] and are
//! recovered by the caller.

use crate::track::{PointRef, TrackId};
use thiserror::Error;

/// Rejected configuration or user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A track needs at least two control points
    #[error("track needs at least 2 control points, got {count}")]
    TooFewControlPoints {
        /// Number of points supplied
        count: usize,
    },

    /// Mass outside the configured range
    #[error("mass {value} outside allowed range [{min}, {max}]")]
    InvalidMass {
        /// Requested mass in kg
        value: f64,
        /// Smallest allowed mass
        min: f64,
        /// Largest allowed mass
        max: f64,
    },

    /// Friction coefficient must be finite and non-negative
    #[error("friction coefficient {0} must be finite and >= 0")]
    InvalidFriction(f64),

    /// Gravity must be finite and positive
    #[error("gravity {0} must be finite and > 0")]
    InvalidGravity(f64),

    /// A position or coordinate was NaN or infinite
    #[error("non-finite value for {field}")]
    NonFinite {
        /// What was being set
        field: &'static str,
    },

    /// Track id does not name a live track
    #[error("unknown track {0:?}")]
    UnknownTrack(TrackId),

    /// Control point index outside the track
    #[error("control point {index} out of range for track with {len} points")]
    PointOutOfRange {
        /// Requested index
        index: usize,
        /// Number of points on the track
        len: usize,
    },

    /// Track points may only be moved on interactive tracks
    #[error("track {0:?} is not interactive")]
    NotInteractive(TrackId),

    /// Joining requires two distinct tracks meeting at end points
    #[error("cannot join {a:?} and {b:?}: {reason}")]
    InvalidJoin {
        /// First end point
        a: PointRef,
        /// Second end point
        b: PointRef,
        /// Why the join was refused
        reason: &'static str,
    },

    /// A simulation config field failed validation
    #[error("invalid config field {field}: {reason}")]
    InvalidConfig {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// Failure of one integration sub-step. The previous state stays valid.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    /// The step produced NaN or infinity
    #[error("sub-step produced a non-finite {0}")]
    NonFinite(&'static str),
}
