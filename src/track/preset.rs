use serde::{Deserialize, Serialize};

use super::path::Track;
use crate::error::ConfigError;
use crate::sim::Vector2;

/// Control-point layout plus interaction flags, enough to build a [`Track`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    pub points: Vec<Vector2>,
    #[serde(default = "default_true")]
    pub interactive: bool,
    #[serde(default = "default_true")]
    pub traversable: bool,
}

fn default_true() -> bool {
    true
}

impl TrackLayout {
    pub fn new(points: Vec<Vector2>, interactive: bool, traversable: bool) -> Self {
        Self {
            points,
            interactive,
            traversable,
        }
    }

    /// Layout the user may ride but not reshape.
    pub fn fixed(points: Vec<Vector2>) -> Self {
        Self::new(points, false, true)
    }

    pub fn build(&self) -> Result<Track, ConfigError> {
        Track::new(&self.points, self.interactive, self.traversable)
    }
}

/// Built-in track shapes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackPreset {
    /// `y = x^2 / 4` with the vertex on the ground at the origin.
    Parabola,
    /// Steep slope running out onto a flat stretch.
    Ramp,
    /// Two valleys separated by a hump.
    DoubleWell,
    /// Drop into a vertical loop.
    Loop,
}

impl TrackPreset {
    pub const ALL: [TrackPreset; 4] = [
        TrackPreset::Parabola,
        TrackPreset::Ramp,
        TrackPreset::DoubleWell,
        TrackPreset::Loop,
    ];

    pub fn layout(self) -> TrackLayout {
        let points = match self {
            TrackPreset::Parabola => (-4..=4)
                .map(|i| {
                    let x = i as f64;
                    Vector2::new(x, 0.25 * x * x)
                })
                .collect(),
            TrackPreset::Ramp => vec![
                Vector2::new(-5.0, 6.0),
                Vector2::new(-3.5, 3.8),
                Vector2::new(-2.0, 1.8),
                Vector2::new(-0.5, 0.6),
                Vector2::new(1.0, 0.3),
                Vector2::new(3.0, 0.3),
                Vector2::new(5.0, 0.3),
            ],
            TrackPreset::DoubleWell => vec![
                Vector2::new(-5.0, 6.0),
                Vector2::new(-3.5, 2.0),
                Vector2::new(-2.0, 0.5),
                Vector2::new(0.0, 2.5),
                Vector2::new(2.0, 0.5),
                Vector2::new(3.5, 2.0),
                Vector2::new(5.0, 6.0),
            ],
            TrackPreset::Loop => vec![
                Vector2::new(-7.0, 8.0),
                Vector2::new(-5.0, 4.0),
                Vector2::new(-3.0, 1.0),
                Vector2::new(-0.5, 0.5),
                Vector2::new(1.5, 1.5),
                Vector2::new(2.0, 3.5),
                Vector2::new(0.5, 5.0),
                Vector2::new(-1.5, 4.0),
                Vector2::new(-1.5, 2.0),
                Vector2::new(0.5, 0.6),
                Vector2::new(3.0, 0.5),
                Vector2::new(6.0, 1.5),
            ],
        };
        TrackLayout::new(points, true, true)
    }

    pub fn build(self) -> Result<Track, ConfigError> {
        self.layout().build()
    }
}
