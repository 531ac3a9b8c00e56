use super::control::{ControlPoint, PointRef};
use super::spline::CurveFit;
use crate::error::ConfigError;
use crate::sim::Vector2;

/// Ordered control points with the curve derived from them.
///
/// The curve is rebuilt synchronously by every mutation, so readers never
/// observe a curve that disagrees with the points.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    points: Vec<ControlPoint>,
    curve: CurveFit,
    interactive: bool,
    traversable: bool,
}

impl Track {
    pub fn new(
        positions: &[Vector2],
        interactive: bool,
        traversable: bool,
    ) -> Result<Self, ConfigError> {
        let curve = CurveFit::new(positions)?;
        Ok(Self {
            points: positions.iter().copied().map(ControlPoint::new).collect(),
            curve,
            interactive,
            traversable,
        })
    }

    pub fn curve(&self) -> &CurveFit {
        &self.curve
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn positions(&self) -> Vec<Vector2> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_traversable(&self) -> bool {
        self.traversable
    }

    pub fn set_traversable(&mut self, traversable: bool) {
        self.traversable = traversable;
    }

    pub fn is_end(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.points.len()
    }

    fn check_index(&self, index: usize) -> Result<(), ConfigError> {
        if index >= self.points.len() {
            return Err(ConfigError::PointOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(())
    }

    /// Moves one control point and rebuilds the curve.
    pub fn move_point(&mut self, index: usize, position: Vector2) -> Result<(), ConfigError> {
        self.check_index(index)?;
        if !position.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "control point",
            });
        }
        let mut positions = self.positions();
        positions[index] = position;
        self.curve.rebuild(&positions)?;
        self.points[index] = self.points[index].with_position(position);
        Ok(())
    }

    pub fn set_snap_target(
        &mut self,
        index: usize,
        target: Option<PointRef>,
    ) -> Result<(), ConfigError> {
        self.check_index(index)?;
        self.points[index] = self.points[index].with_snap_target(target);
        Ok(())
    }

    pub fn snap_target(&self, index: usize) -> Option<PointRef> {
        self.points.get(index).and_then(|p| p.snap_target)
    }

    /// The same track traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        let positions: Vec<Vector2> = points.iter().map(|p| p.position).collect();
        let curve = match CurveFit::new(&positions) {
            Ok(curve) => curve,
            // Positions were already validated when this track was built.
            Err(_) => self.curve.clone(),
        };
        Self {
            points,
            curve,
            interactive: self.interactive,
            traversable: self.traversable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> Track {
        Track::new(
            &[
                Vector2::new(0.0, 3.0),
                Vector2::new(2.0, 1.0),
                Vector2::new(4.0, 0.5),
            ],
            true,
            true,
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_single_point() {
        let err = Track::new(&[Vector2::ZERO], true, true).unwrap_err();
        assert_eq!(err, ConfigError::TooFewControlPoints { count: 1 });
    }

    #[test]
    fn move_point_rebuilds_curve() {
        let mut track = ramp();
        track.move_point(1, Vector2::new(2.0, 2.0)).unwrap();
        assert_relative_eq!(track.curve().position(1.0).y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(track.control_points()[1].position.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn move_point_rejects_bad_index_and_keeps_curve() {
        let mut track = ramp();
        let before = track.clone();
        assert_eq!(
            track.move_point(3, Vector2::ZERO),
            Err(ConfigError::PointOutOfRange { index: 3, len: 3 })
        );
        assert!(track.move_point(0, Vector2::new(f64::NAN, 0.0)).is_err());
        assert_eq!(track, before);
    }

    #[test]
    fn ends_are_first_and_last() {
        let track = ramp();
        assert!(track.is_end(0));
        assert!(!track.is_end(1));
        assert!(track.is_end(2));
    }

    #[test]
    fn reversed_swaps_direction() {
        let track = ramp();
        let rev = track.reversed();
        assert_relative_eq!(rev.curve().position(0.0).x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(rev.curve().position(2.0).x, 0.0, epsilon = 1e-9);
        let forward = track.curve().unit_tangent(0.5);
        let backward = rev.curve().unit_tangent(1.5);
        assert_relative_eq!(forward.dot(backward), -1.0, epsilon = 1e-9);
    }
}
