use super::rider::Side;
use crate::sim::Vector2;
use crate::track::{CurveFit, TrackId, TrackSet};

/// Where an airborne rider touches down.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Landing {
    pub track: TrackId,
    pub u: f64,
    /// Side the rider approached from.
    pub side: Side,
    /// Fraction of the sub-step at which the crossing happened.
    pub fraction: f64,
}

/// Signed distance of `point` from the curve near parameter `u`, positive on
/// the left-normal side.
fn signed_distance(curve: &CurveFit, u: f64, point: Vector2) -> f64 {
    (point - curve.position(u)).dot(curve.unit_normal(u))
}

/// Finds the first traversable track the segment `from -> to` crosses while
/// moving toward it.
///
/// A crossing is a sign change of the signed normal distance, or arriving
/// within `tolerance` of the curve from farther away. Segments that start
/// inside the band are ignored. The touchdown parameter
/// must lie strictly inside the track so riders flying past an end do not
/// snap onto it.
pub fn detect(
    tracks: &TrackSet,
    from: Vector2,
    to: Vector2,
    velocity: Vector2,
    tolerance: f64,
) -> Option<Landing> {
    let travel = from.distance(to);
    let mut best: Option<Landing> = None;

    for (id, track) in tracks.traversable() {
        let curve = track.curve();
        let (u1, _) = curve.closest_point(to);
        if u1 <= 0.0 || u1 >= curve.max_param() {
            continue;
        }
        let (u0, _) = curve.closest_point(from);
        // Closest points on different branches of the curve do not bound a crossing.
        if curve.position(u0).distance(curve.position(u1)) > 2.0 * travel + tolerance {
            continue;
        }

        let d0 = signed_distance(curve, u0, from);
        let d1 = signed_distance(curve, u1, to);
        // Riders already within the contact band, such as one that just left
        // this track, do not land again.
        if d0.abs() <= tolerance {
            continue;
        }
        let crossed = d0 * d1 <= 0.0;
        let grazed = d1.abs() <= tolerance;
        if !(crossed || grazed) {
            continue;
        }

        let side = Side::from_sign(d0);
        let approaching = velocity.dot(curve.unit_normal(u1)) * side.sign() < 0.0;
        if !approaching {
            continue;
        }

        let fraction = if crossed {
            (d0 / (d0 - d1)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if best.map_or(true, |b| fraction < b.fraction) {
            best = Some(Landing {
                track: id,
                u: u1,
                side,
                fraction,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;

    fn floor(set: &mut TrackSet) -> TrackId {
        set.insert(
            Track::new(
                &[
                    Vector2::new(-4.0, 1.0),
                    Vector2::new(0.0, 1.0),
                    Vector2::new(4.0, 1.0),
                ],
                true,
                true,
            )
            .unwrap(),
        )
    }

    #[test]
    fn falling_through_track_lands_on_top() {
        let mut set = TrackSet::new();
        let id = floor(&mut set);
        let landing = detect(
            &set,
            Vector2::new(0.5, 1.01),
            Vector2::new(0.6, 0.99),
            Vector2::new(1.0, -2.0),
            1e-3,
        )
        .unwrap();
        assert_eq!(landing.track, id);
        assert_eq!(landing.side, Side::Positive);
        assert!((landing.u - (1.0 + 0.6 / 4.0)).abs() < 1e-3);
        assert!((landing.fraction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rising_through_track_lands_underneath() {
        let mut set = TrackSet::new();
        floor(&mut set);
        let landing = detect(
            &set,
            Vector2::new(0.0, 0.99),
            Vector2::new(0.0, 1.01),
            Vector2::new(0.0, 2.0),
            1e-3,
        )
        .unwrap();
        assert_eq!(landing.side, Side::Negative);
    }

    #[test]
    fn moving_away_does_not_land() {
        let mut set = TrackSet::new();
        floor(&mut set);
        assert!(detect(
            &set,
            Vector2::new(0.0, 1.0),
            Vector2::new(0.0, 1.02),
            Vector2::new(0.0, 2.0),
            1e-3,
        )
        .is_none());
        assert!(detect(
            &set,
            Vector2::new(0.0, 1.5),
            Vector2::new(0.0, 1.4),
            Vector2::new(0.0, -1.0),
            1e-3,
        )
        .is_none());
    }

    #[test]
    fn passing_beyond_the_end_does_not_land() {
        let mut set = TrackSet::new();
        floor(&mut set);
        assert!(detect(
            &set,
            Vector2::new(5.0, 1.01),
            Vector2::new(5.0, 0.99),
            Vector2::new(0.0, -2.0),
            1e-3,
        )
        .is_none());
    }

    #[test]
    fn grazing_within_tolerance_lands() {
        let mut set = TrackSet::new();
        floor(&mut set);
        let landing = detect(
            &set,
            Vector2::new(0.0, 1.01),
            Vector2::new(0.0, 1.0005),
            Vector2::new(0.0, -1.0),
            1e-3,
        )
        .unwrap();
        assert_eq!(landing.side, Side::Positive);
    }

    #[test]
    fn non_traversable_tracks_are_ignored() {
        let mut set = TrackSet::new();
        let id = floor(&mut set);
        set.get_mut(id).unwrap().set_traversable(false);
        assert!(detect(
            &set,
            Vector2::new(0.0, 1.01),
            Vector2::new(0.0, 0.99),
            Vector2::new(0.0, -2.0),
            1e-3,
        )
        .is_none());
    }
}
