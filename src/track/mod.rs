//! Editable tracks and the curves derived from them.
//!
//! Tracks are stored in a [`TrackSet`] arena. Each [`Track`] owns its
//! [`ControlPoint`]s and rebuilds its [`CurveFit`] whenever one moves.

mod arena;
mod control;
mod path;
mod preset;
mod spline;

pub use arena::{Join, ParamMap, TrackId, TrackSet};
pub use control::{ControlPoint, PointRef};
pub use path::Track;
pub use preset::{TrackLayout, TrackPreset};
pub use spline::{CurveFit, CurveKind};
