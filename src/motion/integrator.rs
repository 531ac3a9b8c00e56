//! Sub-step integration of the rider.
//!
//! Grounded riders integrate `(u, s)` along the curve with RK4, where `s` is
//! the signed speed along the tangent. After each step the speed is
//! corrected so mechanical energy matches its pre-step value, then friction
//! work moves kinetic energy into the thermal accumulator. The total energy
//! on a track is therefore conserved up to rounding, and mechanical energy
//! never grows.
//!
//! Airborne riders integrate `(x, y, vx, vy)` with RK4 under constant
//! gravity, stop against the ground plane and may land on any traversable
//! track they cross.

use tracing::{debug, warn};

use super::landing;
use super::rider::{Attachment, Motion, RiderState};
use crate::error::StepError;
use crate::sim::physics::{self, EPSILON, MAX_PARAM_STEP, MAX_SPLITS, REST_SPEED};
use crate::sim::{Forces, PhysicsParams, Vector2};
use crate::track::{CurveFit, Track, TrackSet};

const BISECTIONS: usize = 48;

/// Everything a sub-step reads besides the rider itself.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub tracks: &'a TrackSet,
    pub params: &'a PhysicsParams,
    pub ground_level: f64,
    /// Half-width, in parameter units, of the curvature sample stencil.
    pub curvature_epsilon: f64,
    pub landing_tolerance: f64,
}

/// Classic fourth-order Runge-Kutta step for an autonomous system.
fn rk4<const N: usize>(y: [f64; N], h: f64, f: impl Fn(&[f64; N]) -> [f64; N]) -> [f64; N] {
    let offset = |base: &[f64; N], k: &[f64; N], scale: f64| {
        let mut out = *base;
        for i in 0..N {
            out[i] += k[i] * scale;
        }
        out
    };

    let k1 = f(&y);
    let k2 = f(&offset(&y, &k1, h / 2.0));
    let k3 = f(&offset(&y, &k2, h / 2.0));
    let k4 = f(&offset(&y, &k3, h));

    let mut out = y;
    for i in 0..N {
        out[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    out
}

/// Contact forces for a rider at `u` moving with signed speed `speed`.
pub fn contact_forces(
    curve: &CurveFit,
    attachment: &Attachment,
    mass: f64,
    params: &PhysicsParams,
    curvature_epsilon: f64,
) -> Forces {
    let u = attachment.u;
    let tangent = curve.unit_tangent(u);
    let normal = tangent.perp();
    let kappa = curve
        .curvature(u, curvature_epsilon)
        .signed(curve.position(u), normal);
    Forces::compute(
        kappa,
        tangent,
        normal,
        attachment.side.sign(),
        attachment.speed,
        mass,
        params.gravity,
    )
}

/// Advances the rider by `dt` seconds.
///
/// Dragged riders are returned unchanged. A result containing NaN or
/// infinity is reported as [`StepError::NonFinite`] so the caller can keep
/// the previous state.
pub fn advance(prev: &RiderState, ctx: &StepContext, dt: f64) -> Result<RiderState, StepError> {
    let next = match prev.motion {
        Motion::Dragged => return Ok(*prev),
        Motion::Airborne => advance_airborne(prev, ctx, dt),
        Motion::Grounded(attachment) => match ctx.tracks.get(attachment.track) {
            Some(track) if track.is_traversable() => {
                advance_grounded(prev, attachment, track, ctx, dt)
            }
            _ => {
                debug!(track = ?attachment.track, "attached track gone, rider released");
                advance_airborne(&prev.airborne(), ctx, dt)
            }
        },
    };

    if !next.is_finite() {
        warn!(regime = ?prev.regime(), "discarding non-finite sub-step");
        return Err(StepError::NonFinite("rider state"));
    }
    Ok(next)
}

fn advance_grounded(
    prev: &RiderState,
    attachment: Attachment,
    track: &Track,
    ctx: &StepContext,
    dt: f64,
) -> RiderState {
    let curve = track.curve();
    let mut state = *prev;
    let mut current = attachment;
    let mut remaining = dt;
    for split in 0..MAX_SPLITS {
        if remaining <= 0.0 {
            break;
        }
        // Each internal step covers at most MAX_PARAM_STEP of the path
        // parameter at the current rate; the last one takes what is left.
        let param_rate = current.speed.abs() / curve.param_speed(current.u).max(EPSILON);
        let h = if split + 1 == MAX_SPLITS || param_rate * remaining <= MAX_PARAM_STEP {
            remaining
        } else {
            MAX_PARAM_STEP / param_rate
        };
        match grounded_step(&state, current, curve, ctx, h) {
            GroundedStep::Stay(next) => {
                state = next;
                if let Some(a) = next.attachment() {
                    current = a;
                }
            }
            GroundedStep::Leave(released) => {
                return advance_airborne(&released, ctx, remaining);
            }
            GroundedStep::LeaveAfter(released) => {
                remaining -= h;
                if remaining <= 0.0 {
                    return released;
                }
                return advance_airborne(&released, ctx, remaining);
            }
        }
        remaining -= h;
    }
    state
}

enum GroundedStep {
    Stay(RiderState),
    /// Released before moving; the whole internal step is still to fly.
    Leave(RiderState),
    /// Ran off the end of the track during the internal step.
    LeaveAfter(RiderState),
}

fn grounded_step(
    prev: &RiderState,
    attachment: Attachment,
    curve: &CurveFit,
    ctx: &StepContext,
    h: f64,
) -> GroundedStep {
    let mass = prev.mass;
    let gravity = ctx.params.gravity;
    let friction = ctx.params.friction;

    let forces0 = contact_forces(curve, &attachment, mass, ctx.params, ctx.curvature_epsilon);
    if !forces0.keeps_contact() {
        debug!(
            u = attachment.u,
            speed = attachment.speed,
            normal = forces0.normal,
            "normal force negative, rider leaves track"
        );
        return GroundedStep::Leave(prev.airborne());
    }

    let u0 = attachment.u;
    let s0 = attachment.speed;

    if s0.abs() < REST_SPEED && friction > 0.0 && forces0.static_friction_holds(friction) {
        let residual = 0.5 * mass * s0 * s0;
        let held = Attachment { speed: 0.0, ..attachment };
        return GroundedStep::Stay(RiderState::grounded(
            mass,
            curve,
            held,
            prev.thermal + residual,
        ));
    }

    let [u_rk, s_rk] = rk4([u0, s0], h, |y| {
        let tangent = curve.unit_tangent(y[0]);
        [
            y[1] / curve.param_speed(y[0]).max(EPSILON),
            -gravity * tangent.y,
        ]
    });
    // Coincident control points give zero-length segments where du/dt
    // blows up. They are crossed at most MAX_PARAM_STEP at a time, and no
    // step moves the rider farther than its speed allows.
    let u_rk = u0 + (u_rk - u0).clamp(-MAX_PARAM_STEP, MAX_PARAM_STEP);
    let u_rk = limit_travel(curve, u0, u_rk, (s0.abs() + gravity * h) * h);

    // Energy correction against the pre-step mechanical energy.
    let y0 = curve.position(u0).y;
    let direction = if s_rk != 0.0 { s_rk.signum() } else { s0.signum() };
    let (u1, mut s1) = {
        let v_sq = physics::speed_squared_after_drop(s0, curve.position(u_rk).y - y0, gravity);
        if v_sq >= 0.0 {
            (u_rk, direction * v_sq.sqrt())
        } else {
            let u_turn = turnaround(curve, u0, u_rk, y0 + s0 * s0 / (2.0 * gravity));
            let speed = physics::update_speed(s0, curve.position(u_turn).y - y0, gravity);
            (u_turn, direction * speed)
        }
    };

    let mut thermal = prev.thermal;
    if friction > 0.0 {
        let after = Attachment {
            u: u1,
            speed: s1,
            ..attachment
        };
        let forces1 = contact_forces(curve, &after, mass, ctx.params, ctx.curvature_epsilon);
        let normal = 0.5 * (forces0.normal.abs() + forces1.normal.abs());
        let work = friction * normal * curve.arc_length(u0, u1);
        let kinetic = 0.5 * mass * s1 * s1;
        let lost = work.min(kinetic).max(0.0);
        s1 = s1.signum() * (2.0 * (kinetic - lost) / mass).max(0.0).sqrt();
        thermal += lost;
    }

    let next = RiderState::grounded(
        mass,
        curve,
        Attachment {
            u: u1,
            speed: s1,
            ..attachment
        },
        thermal,
    );

    if !curve.contains_param(u1) {
        debug!(u = u1, speed = s1, "rider ran off the end of the track");
        return GroundedStep::LeaveAfter(next.airborne());
    }
    GroundedStep::Stay(next)
}

/// Pulls `u1` back toward `u0` until the chord from `u0` fits within `reach`.
fn limit_travel(curve: &CurveFit, u0: f64, u1: f64, reach: f64) -> f64 {
    let start = curve.position(u0);
    if curve.position(u1).distance(start) <= reach {
        return u1;
    }
    let mut inside = u0;
    let mut outside = u1;
    for _ in 0..BISECTIONS {
        let mid = 0.5 * (inside + outside);
        if curve.position(mid).distance(start) <= reach {
            inside = mid;
        } else {
            outside = mid;
        }
    }
    inside
}

/// Parameter between `u0` and `u1` where the curve reaches `max_height`,
/// staying on the reachable side.
fn turnaround(curve: &CurveFit, u0: f64, u1: f64, max_height: f64) -> f64 {
    let mut reachable = u0;
    let mut unreachable = u1;
    for _ in 0..BISECTIONS {
        let mid = 0.5 * (reachable + unreachable);
        if curve.position(mid).y <= max_height {
            reachable = mid;
        } else {
            unreachable = mid;
        }
    }
    reachable
}

fn advance_airborne(prev: &RiderState, ctx: &StepContext, dt: f64) -> RiderState {
    let gravity = ctx.params.gravity;
    let from = prev.position;
    let [x, y, vx, vy] = rk4(
        [prev.position.x, prev.position.y, prev.velocity.x, prev.velocity.y],
        dt,
        |s| [s[2], s[3], 0.0, -gravity],
    );

    let mut next = RiderState {
        motion: Motion::Airborne,
        position: Vector2::new(x, y),
        velocity: Vector2::new(vx, vy),
        ..*prev
    };

    if y < ctx.ground_level {
        next = hit_ground(prev, ctx.ground_level, gravity, dt);
    }

    match landing::detect(
        ctx.tracks,
        from,
        next.position,
        next.velocity,
        ctx.landing_tolerance,
    ) {
        Some(touchdown) => land(&next, touchdown, ctx),
        None => next,
    }
}

/// Stops the fall at the ground plane and slides on horizontally.
///
/// The vertical kinetic energy at impact goes into the thermal accumulator.
/// A rider already below the plane is lifted onto it, and the lift is paid
/// for out of its kinetic energy, vertical part first.
fn hit_ground(prev: &RiderState, ground: f64, gravity: f64, dt: f64) -> RiderState {
    let height = prev.position.y - ground;
    let vy0 = prev.velocity.y;
    let t_hit = if height <= 0.0 {
        0.0
    } else {
        ((vy0 + (vy0 * vy0 + 2.0 * gravity * height).sqrt()) / gravity).clamp(0.0, dt)
    };
    let vy_hit = vy0 - gravity * t_hit;
    let mut absorbed = 0.5 * prev.mass * vy_hit * vy_hit;
    let mut vx = prev.velocity.x;

    if height < 0.0 {
        let mut lift = prev.mass * gravity * -height;
        let from_vertical = lift.min(absorbed);
        absorbed -= from_vertical;
        lift -= from_vertical;
        let horizontal = 0.5 * prev.mass * vx * vx;
        if lift > horizontal {
            warn!(depth = -height, "rider lifted onto the ground without enough energy");
        }
        vx = vx.signum() * (2.0 * (horizontal - lift).max(0.0) / prev.mass).sqrt();
    }
    if absorbed > 0.0 {
        debug!(vy = vy_hit, absorbed, "rider hit the ground");
    }

    RiderState::new(
        prev.mass,
        Motion::Airborne,
        Vector2::new(prev.position.x + vx * dt, ground),
        Vector2::new(vx, 0.0),
        0.0,
        prev.thermal + absorbed,
    )
}

/// Attaches an airborne rider at a touchdown point.
///
/// Speed magnitude is kept, adjusted only for the height difference between
/// the rider and the attachment point; the direction is reprojected onto
/// the tangent.
fn land(airborne: &RiderState, touchdown: landing::Landing, ctx: &StepContext) -> RiderState {
    let Some(track) = ctx.tracks.get(touchdown.track) else {
        return *airborne;
    };
    let curve = track.curve();
    let attach_point = curve.position(touchdown.u);
    let tangent = curve.unit_tangent(touchdown.u);

    let speed = physics::update_speed(
        airborne.speed(),
        attach_point.y - airborne.position.y,
        ctx.params.gravity,
    );
    let direction = if airborne.velocity.dot(tangent) < 0.0 {
        -1.0
    } else {
        1.0
    };

    debug!(
        track = ?touchdown.track,
        u = touchdown.u,
        side = ?touchdown.side,
        speed,
        "rider landed"
    );
    RiderState::grounded(
        airborne.mass,
        curve,
        Attachment::new(touchdown.track, touchdown.u, touchdown.side, direction * speed),
        airborne.thermal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::energy::EnergyLedger;
    use crate::motion::rider::{Regime, Side};
    use crate::sim::physics::G;
    use crate::track::{Track, TrackId};
    use approx::assert_relative_eq;

    const DT: f64 = 1e-3;

    fn context<'a>(tracks: &'a TrackSet, params: &'a PhysicsParams) -> StepContext<'a> {
        StepContext {
            tracks,
            params,
            ground_level: 0.0,
            curvature_epsilon: 1e-3,
            landing_tolerance: 1e-3,
        }
    }

    fn hump(radius: f64) -> Track {
        // Upper arc of a circle centered at (0, 0), crest at (0, radius).
        let points: Vec<Vector2> = (0..=40)
            .map(|i| {
                let angle = std::f64::consts::PI * (0.9 - 0.8 * i as f64 / 40.0);
                Vector2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Track::new(&points, true, true).unwrap()
    }

    fn valley() -> Track {
        Track::new(
            &(-4..=4)
                .map(|i| Vector2::new(i as f64, 0.25 * (i * i) as f64))
                .collect::<Vec<_>>(),
            true,
            true,
        )
        .unwrap()
    }

    fn ride(id: TrackId, tracks: &TrackSet, u: f64, speed: f64) -> RiderState {
        let curve = tracks.get(id).unwrap().curve();
        RiderState::grounded(70.0, curve, Attachment::new(id, u, Side::Positive, speed), 0.0)
    }

    #[test]
    fn rk4_integrates_constant_acceleration_exactly() {
        let [x, v] = rk4([0.0, 1.0], 0.5, |s| [s[1], -2.0]);
        assert_relative_eq!(x, 0.5 - 0.25, epsilon = 1e-12);
        assert_relative_eq!(v, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn dragged_rider_is_not_integrated() {
        let tracks = TrackSet::new();
        let params = PhysicsParams::default();
        let state = RiderState::at_rest(50.0, Vector2::new(0.0, 3.0)).dragged_to(Vector2::new(1.0, 3.0));
        let next = advance(&state, &context(&tracks, &params), DT).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn free_fall_matches_projectile_motion() {
        let tracks = TrackSet::new();
        let params = PhysicsParams::default();
        let mut state = RiderState::at_rest(50.0, Vector2::new(0.0, 10.0));
        state.velocity = Vector2::new(2.0, 0.0);
        for _ in 0..500 {
            state = advance(&state, &context(&tracks, &params), DT).unwrap();
        }
        assert_relative_eq!(state.position.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(state.position.y, 10.0 - 0.5 * G * 0.25, epsilon = 1e-9);
        assert_relative_eq!(state.velocity.y, -G * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn ground_impact_moves_vertical_energy_to_thermal() {
        let tracks = TrackSet::new();
        let params = PhysicsParams::default();
        let mut state = RiderState::at_rest(50.0, Vector2::new(0.0, 2.0));
        state.velocity = Vector2::new(1.5, 0.0);
        let ctx = context(&tracks, &params);
        let start = EnergyLedger::snapshot(&state, &params).total;
        for _ in 0..1500 {
            state = advance(&state, &ctx, DT).unwrap();
        }
        assert_relative_eq!(state.position.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(state.velocity.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(state.velocity.x, 1.5, epsilon = 1e-12);
        let energy = EnergyLedger::snapshot(&state, &params);
        assert_relative_eq!(energy.thermal, 50.0 * G * 2.0, max_relative = 1e-9);
        assert_relative_eq!(energy.total, start, max_relative = 1e-9);
    }

    #[test]
    fn resting_on_ground_adds_no_thermal() {
        let tracks = TrackSet::new();
        let params = PhysicsParams::default();
        let mut state = RiderState::at_rest(50.0, Vector2::new(0.0, 0.0));
        for _ in 0..100 {
            state = advance(&state, &context(&tracks, &params), DT).unwrap();
        }
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.thermal, 0.0);
    }

    #[test]
    fn crest_keeps_rider_below_critical_speed() {
        let radius = 5.0;
        let mut tracks = TrackSet::new();
        let id = tracks.insert(hump(radius));
        let params = PhysicsParams::default();
        let critical = (G * radius).sqrt();
        let state = ride(id, &tracks, 20.0, 0.9 * critical);
        let next = advance(&state, &context(&tracks, &params), DT).unwrap();
        assert_eq!(next.regime(), Regime::Grounded);
    }

    #[test]
    fn crest_releases_rider_above_critical_speed() {
        let radius = 5.0;
        let mut tracks = TrackSet::new();
        let id = tracks.insert(hump(radius));
        let params = PhysicsParams::default();
        let critical = (G * radius).sqrt();
        let state = ride(id, &tracks, 20.0, 1.1 * critical);
        let next = advance(&state, &context(&tracks, &params), DT).unwrap();
        assert_eq!(next.regime(), Regime::Airborne);
        // Leaves along the tangent at the crest, which is horizontal.
        assert!(next.velocity.x.abs() > 0.99 * 1.1 * critical);
    }

    #[test]
    fn detachment_happens_exactly_past_critical_speed() {
        let radius = 5.0;
        let mut tracks = TrackSet::new();
        let id = tracks.insert(hump(radius));
        let params = PhysicsParams::default();
        let critical = (G * radius).sqrt();
        let ctx = context(&tracks, &params);
        for factor in [0.98, 0.995] {
            let next = advance(&ride(id, &tracks, 20.0, factor * critical), &ctx, DT).unwrap();
            assert_eq!(next.regime(), Regime::Grounded, "factor {factor}");
        }
        for factor in [1.005, 1.02] {
            let next = advance(&ride(id, &tracks, 20.0, factor * critical), &ctx, DT).unwrap();
            assert_eq!(next.regime(), Regime::Airborne, "factor {factor}");
        }
    }

    #[test]
    fn frictionless_valley_conserves_energy() {
        let mut tracks = TrackSet::new();
        let id = tracks.insert(valley());
        let params = PhysicsParams::default();
        let ctx = context(&tracks, &params);
        let mut state = ride(id, &tracks, 2.0, 0.0);
        let start = EnergyLedger::snapshot(&state, &params).total;
        for _ in 0..5000 {
            state = advance(&state, &ctx, DT).unwrap();
            assert_eq!(state.regime(), Regime::Grounded);
            let total = EnergyLedger::snapshot(&state, &params).total;
            assert_relative_eq!(total, start, max_relative = 1e-6);
        }
        assert_eq!(state.thermal, 0.0);
    }

    #[test]
    fn friction_moves_energy_into_thermal() {
        let mut tracks = TrackSet::new();
        let id = tracks.insert(valley());
        let params = PhysicsParams::default().with_friction(0.2).unwrap();
        let ctx = context(&tracks, &params);
        let mut state = ride(id, &tracks, 2.0, 0.0);
        let start = EnergyLedger::snapshot(&state, &params);
        let mut last_thermal = 0.0;
        let mut last_mechanical = start.kinetic + start.potential;
        for _ in 0..3000 {
            state = advance(&state, &ctx, DT).unwrap();
            let e = EnergyLedger::snapshot(&state, &params);
            assert!(e.thermal >= last_thermal);
            assert!(e.kinetic + e.potential <= last_mechanical + 1e-9);
            assert!(e.total <= start.total + 1e-9);
            last_thermal = e.thermal;
            last_mechanical = e.kinetic + e.potential;
        }
        assert!(last_thermal > 0.0);
    }

    #[test]
    fn static_friction_holds_rider_on_gentle_slope() {
        let mut tracks = TrackSet::new();
        let id = tracks.insert(
            Track::new(&[Vector2::new(0.0, 1.0), Vector2::new(10.0, 2.0)], true, true).unwrap(),
        );
        let params = PhysicsParams::default().with_friction(0.5).unwrap();
        let state = ride(id, &tracks, 0.5, 0.0);
        let next = advance(&state, &context(&tracks, &params), DT).unwrap();
        assert_eq!(next.attachment().unwrap().u, 0.5);
        assert_eq!(next.attachment().unwrap().speed, 0.0);
    }

    #[test]
    fn running_off_the_end_goes_airborne() {
        let mut tracks = TrackSet::new();
        let id = tracks.insert(
            Track::new(&[Vector2::new(0.0, 1.0), Vector2::new(1.0, 1.0)], true, true).unwrap(),
        );
        let params = PhysicsParams::default();
        let ctx = context(&tracks, &params);
        let mut state = ride(id, &tracks, 0.9, 5.0);
        for _ in 0..50 {
            state = advance(&state, &ctx, DT).unwrap();
        }
        assert_eq!(state.regime(), Regime::Airborne);
        assert!(state.position.x > 1.0);
        assert_relative_eq!(state.velocity.x, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn falling_rider_lands_and_keeps_speed() {
        let mut tracks = TrackSet::new();
        let id = tracks.insert(
            Track::new(
                &[
                    Vector2::new(-5.0, 1.0),
                    Vector2::new(0.0, 1.0),
                    Vector2::new(5.0, 1.0),
                ],
                true,
                true,
            )
            .unwrap(),
        );
        let params = PhysicsParams::default();
        let ctx = context(&tracks, &params);
        let mut state = RiderState::at_rest(60.0, Vector2::new(0.0, 2.0));
        state.velocity = Vector2::new(1.0, 0.0);
        let mut landed = None;
        for _ in 0..1000 {
            let before = state;
            state = advance(&state, &ctx, DT).unwrap();
            if state.regime() == Regime::Grounded {
                landed = Some((before, state));
                break;
            }
        }
        let (before, after) = landed.expect("rider should land");
        let attachment = after.attachment().unwrap();
        assert_eq!(attachment.track, id);
        assert_eq!(attachment.side, Side::Positive);
        assert!(attachment.speed > 0.0);
        assert_relative_eq!(after.position.y, 1.0, epsilon = 1e-9);
        // Speed magnitude preserved up to the sub-step's fall.
        assert_relative_eq!(after.speed(), before.speed(), max_relative = 0.01);
    }

    #[test]
    fn coincident_points_are_crossed_without_jumping() {
        let gaps = [0.0, 1e-6];
        for gap in gaps {
            let mut tracks = TrackSet::new();
            let id = tracks.insert(
                Track::new(
                    &[
                        Vector2::new(0.0, 1.0),
                        Vector2::new(1.0, 1.0),
                        Vector2::new(1.0 + gap, 1.0),
                        Vector2::new(2.0, 1.0),
                        Vector2::new(3.0, 1.0),
                    ],
                    true,
                    true,
                )
                .unwrap(),
            );
            let params = PhysicsParams::default();
            let ctx = context(&tracks, &params);
            let mut state = ride(id, &tracks, 0.5, 1.0);
            for _ in 0..1000 {
                let before = state.position;
                state = advance(&state, &ctx, DT).unwrap();
                assert!(
                    state.position.distance(before) < 1.5 * DT,
                    "gap {gap}: jumped from {before:?} to {:?}",
                    state.position
                );
            }
            assert_eq!(state.regime(), Regime::Grounded);
            assert_relative_eq!(state.position.x, 1.5 + gap, epsilon = 2e-3);
            assert_relative_eq!(state.position.y, 1.0, epsilon = 1e-9);
            assert_relative_eq!(state.attachment().unwrap().speed, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn lifting_onto_the_ground_never_adds_energy() {
        let tracks = TrackSet::new();
        let params = PhysicsParams::default();
        let ctx = context(&tracks, &params);
        let mut state = RiderState::at_rest(50.0, Vector2::new(0.0, -0.05));
        state.velocity = Vector2::new(2.0, -0.5);
        let start = EnergyLedger::snapshot(&state, &params).total;

        let next = advance(&state, &ctx, DT).unwrap();
        assert_eq!(next.position.y, 0.0);
        assert_eq!(next.velocity.y, 0.0);
        assert!(next.velocity.x > 0.0 && next.velocity.x < 2.0);
        let energy = EnergyLedger::snapshot(&next, &params);
        assert_relative_eq!(energy.total, start, max_relative = 1e-9);
        assert!(energy.thermal >= 0.0);
    }

    #[test]
    fn removed_track_releases_rider() {
        let mut tracks = TrackSet::new();
        let id = tracks.insert(valley());
        let state = ride(id, &tracks, 3.0, 1.0);
        tracks.remove(id);
        let params = PhysicsParams::default();
        let next = advance(&state, &context(&tracks, &params), DT).unwrap();
        assert_eq!(next.regime(), Regime::Airborne);
    }

    #[test]
    fn non_finite_state_is_rejected() {
        let tracks = TrackSet::new();
        let params = PhysicsParams::default();
        let mut state = RiderState::at_rest(50.0, Vector2::new(0.0, 3.0));
        state.velocity.x = f64::NAN;
        let err = advance(&state, &context(&tracks, &params), DT).unwrap_err();
        assert_eq!(err, StepError::NonFinite("rider state"));
    }
}
