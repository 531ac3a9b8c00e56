use std::f64::consts::PI;

pub const G: f64 = 9.80665;
/// Default integration rate of the sub-step loop.
pub const HZ: f64 = 1000.0;
pub const DT: f64 = 1.0 / HZ;
pub const EPSILON: f64 = 1e-9;
/// Below this speed a grounded rider counts as at rest for static friction.
pub const REST_SPEED: f64 = 1e-3;
/// Largest change of the path parameter allowed within one internal grounded step.
pub const MAX_PARAM_STEP: f64 = 0.1;
/// Upper bound on internal splits of one grounded sub-step.
pub const MAX_SPLITS: usize = 64;

pub fn wrap_angle(rad: f64) -> f64 {
    if (-PI..=PI).contains(&rad) {
        return rad;
    }
    const TWO_PI: f64 = 2.0 * PI;
    (rad + PI).rem_euclid(TWO_PI) - PI
}

/// Squared speed after changing height by `delta_y` with no other losses.
///
/// Works with the small height delta instead of absolute energies, which
/// avoids catastrophic cancellation when both energies are large. Returns a
/// negative value when the rider cannot reach the new height.
pub fn speed_squared_after_drop(prev_speed: f64, delta_y: f64, gravity: f64) -> f64 {
    prev_speed * prev_speed - 2.0 * gravity * delta_y
}

/// Speed after changing height by `delta_y`, clamped at rest.
pub fn update_speed(prev_speed: f64, delta_y: f64, gravity: f64) -> f64 {
    speed_squared_after_drop(prev_speed, delta_y, gravity)
        .max(0.0)
        .sqrt()
}
