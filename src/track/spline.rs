use crate::error::ConfigError;
use crate::sim::{Curvature, Vector2};

/// Adjacent points closer than this fraction of the mean spacing force linear segments.
const MIN_SPACING_RATIO: f64 = 1e-3;
/// Largest perpendicular deviation, relative to the chord, still considered collinear.
const COLLINEAR_RATIO: f64 = 1e-9;
/// Coarse samples per segment for closest-point search.
const SEARCH_SAMPLES_PER_SEGMENT: usize = 16;
const GOLDEN_ITERATIONS: usize = 48;

/// How the curve interpolates between control points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CurveKind {
    /// Natural cubic spline through all points.
    Cubic,
    /// Straight segments between points.
    Linear,
}

/// Cubic polynomial `a + b t + c t^2 + d t^3` for one segment, `t` in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
struct Segment {
    a: Vector2,
    b: Vector2,
    c: Vector2,
    d: Vector2,
}

impl Segment {
    fn linear(start: Vector2, end: Vector2) -> Self {
        Self {
            a: start,
            b: end - start,
            c: Vector2::ZERO,
            d: Vector2::ZERO,
        }
    }

    fn position(&self, t: f64) -> Vector2 {
        self.a + (self.b + (self.c + self.d * t) * t) * t
    }

    fn derivative(&self, t: f64) -> Vector2 {
        self.b + (self.c * 2.0 + self.d * (3.0 * t)) * t
    }

    fn second_derivative(&self, t: f64) -> Vector2 {
        self.c * 2.0 + self.d * (6.0 * t)
    }
}

/// Smooth parametric curve through an ordered list of control points.
///
/// Control point `i` sits at parameter `u = i`, so the domain is
/// `[0, N - 1]`. Outside the domain the curve continues as a straight line
/// along the end tangent.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFit {
    points: Vec<Vector2>,
    segments: Vec<Segment>,
    kind: CurveKind,
}

impl CurveFit {
    pub fn new(points: &[Vector2]) -> Result<Self, ConfigError> {
        let mut curve = Self {
            points: Vec::new(),
            segments: Vec::new(),
            kind: CurveKind::Linear,
        };
        curve.rebuild(points)?;
        Ok(curve)
    }

    /// Recomputes all coefficients from `points`.
    pub fn rebuild(&mut self, points: &[Vector2]) -> Result<(), ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::TooFewControlPoints {
                count: points.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(ConfigError::NonFinite {
                field: "control point",
            });
        }

        self.points.clear();
        self.points.extend_from_slice(points);
        self.kind = if needs_linear_fallback(points) {
            CurveKind::Linear
        } else {
            CurveKind::Cubic
        };
        self.segments = match self.kind {
            CurveKind::Linear => points
                .windows(2)
                .map(|w| Segment::linear(w[0], w[1]))
                .collect(),
            CurveKind::Cubic => natural_cubic_segments(points),
        };
        Ok(())
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn points(&self) -> &[Vector2] {
        &self.points
    }

    /// Largest parameter value, `N - 1`.
    pub fn max_param(&self) -> f64 {
        self.segments.len() as f64
    }

    pub fn contains_param(&self, u: f64) -> bool {
        (0.0..=self.max_param()).contains(&u)
    }

    /// Segment index and local parameter for `u` clamped to the domain.
    fn locate(&self, u: f64) -> (usize, f64) {
        let last = self.segments.len() - 1;
        if u <= 0.0 {
            return (0, 0.0);
        }
        if u >= self.max_param() {
            return (last, 1.0);
        }
        let index = (u.floor() as usize).min(last);
        (index, u - index as f64)
    }

    pub fn position(&self, u: f64) -> Vector2 {
        let max = self.max_param();
        if u < 0.0 {
            return self.points[0] + self.tangent(0.0) * u;
        }
        if u > max {
            return self.points[self.points.len() - 1] + self.tangent(max) * (u - max);
        }
        let (index, t) = self.locate(u);
        self.segments[index].position(t)
    }

    /// First derivative with respect to `u`, constant past the ends.
    pub fn tangent(&self, u: f64) -> Vector2 {
        let (index, t) = self.locate(u);
        self.segments[index].derivative(t)
    }

    /// Second derivative with respect to `u`, zero past the ends.
    pub fn second_derivative(&self, u: f64) -> Vector2 {
        if !self.contains_param(u) {
            return Vector2::ZERO;
        }
        let (index, t) = self.locate(u);
        self.segments[index].second_derivative(t)
    }

    /// Unit tangent in the direction of increasing `u`.
    ///
    /// Where the derivative vanishes (coincident points) the direction of the
    /// surrounding chord is used, then `+x`.
    pub fn unit_tangent(&self, u: f64) -> Vector2 {
        let direct = self.tangent(u);
        if direct.magnitude() > f64::EPSILON {
            return direct.normalize();
        }
        let chord = self.position(u + 1.0) - self.position(u - 1.0);
        if chord.magnitude() > f64::EPSILON {
            return chord.normalize();
        }
        Vector2::RIGHT
    }

    /// Left normal: the unit tangent rotated by +90 degrees.
    pub fn unit_normal(&self, u: f64) -> Vector2 {
        self.unit_tangent(u).perp()
    }

    /// Speed of the parametrization `|dp/du|`.
    pub fn param_speed(&self, u: f64) -> f64 {
        self.tangent(u).magnitude()
    }

    /// Arc length between `u0` and `u1` (Simpson's rule), always non-negative.
    pub fn arc_length(&self, u0: f64, u1: f64) -> f64 {
        let mid = 0.5 * (u0 + u1);
        let h = (u1 - u0).abs();
        h / 6.0 * (self.param_speed(u0) + 4.0 * self.param_speed(mid) + self.param_speed(u1))
    }

    /// Three-point circle fit around `u` with half-width `epsilon`.
    pub fn curvature(&self, u: f64, epsilon: f64) -> Curvature {
        Curvature::fit(
            self.position(u - epsilon),
            self.position(u),
            self.position(u + epsilon),
        )
    }

    /// Parameter of the point on the curve closest to `target`, searched over
    /// `[0, N - 1]`, with its distance.
    pub fn closest_point(&self, target: Vector2) -> (f64, f64) {
        let max = self.max_param();
        let samples = self.segments.len() * SEARCH_SAMPLES_PER_SEGMENT;
        let step = max / samples as f64;

        let mut best_u = 0.0;
        let mut best_dist = f64::INFINITY;
        for i in 0..=samples {
            let u = i as f64 * step;
            let dist = self.position(u).distance(target);
            if dist < best_dist {
                best_dist = dist;
                best_u = u;
            }
        }

        // Golden-section refinement inside the bracketing samples.
        let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
        let mut lo = (best_u - step).max(0.0);
        let mut hi = (best_u + step).min(max);
        let dist_at = |u: f64| self.position(u).distance(target);
        let mut x1 = hi - inv_phi * (hi - lo);
        let mut x2 = lo + inv_phi * (hi - lo);
        let mut f1 = dist_at(x1);
        let mut f2 = dist_at(x2);
        for _ in 0..GOLDEN_ITERATIONS {
            if f1 < f2 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - inv_phi * (hi - lo);
                f1 = dist_at(x1);
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + inv_phi * (hi - lo);
                f2 = dist_at(x2);
            }
        }
        let refined = 0.5 * (lo + hi);
        let refined_dist = dist_at(refined);
        if refined_dist < best_dist {
            (refined, refined_dist)
        } else {
            (best_u, best_dist)
        }
    }

    /// Samples the curve at roughly uniform arc-length spacing for drawing.
    ///
    /// Always returns both end points; `resolution` is the target spacing in
    /// meters.
    pub fn resample(&self, resolution: f64) -> Vec<Vector2> {
        let max = self.max_param();
        let fine = self.segments.len() * SEARCH_SAMPLES_PER_SEGMENT;

        // Cumulative chord length table over a fine uniform parameter grid.
        let mut params = Vec::with_capacity(fine + 1);
        let mut arcs = Vec::with_capacity(fine + 1);
        let mut prev = self.position(0.0);
        let mut total = 0.0;
        for i in 0..=fine {
            let u = max * i as f64 / fine as f64;
            let p = self.position(u);
            total += p.distance(prev);
            prev = p;
            params.push(u);
            arcs.push(total);
        }

        if total <= 0.0 || resolution <= 0.0 || !resolution.is_finite() {
            return self.points.clone();
        }

        let num_samples = 2.max((total / resolution).ceil() as usize + 1);
        let mut result = Vec::with_capacity(num_samples);
        for i in 0..num_samples {
            let target_arc = total * i as f64 / (num_samples - 1) as f64;
            result.push(self.position(param_at_arc(&params, &arcs, target_arc)));
        }
        result
    }
}

/// Parameter for `arc` by binary search in the cumulative table, then linear
/// interpolation inside the bracketing entry.
fn param_at_arc(params: &[f64], arcs: &[f64], arc: f64) -> f64 {
    let last = arcs.len() - 1;
    if arc <= arcs[0] {
        return params[0];
    }
    if arc >= arcs[last] {
        return params[last];
    }

    let mut lo = 0usize;
    let mut hi = last;
    while lo < hi - 1 {
        let mid = (lo + hi) / 2;
        if arcs[mid] <= arc {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let seg_len = arcs[lo + 1] - arcs[lo];
    let t = if seg_len > 0.0 {
        (arc - arcs[lo]) / seg_len
    } else {
        0.0
    };
    params[lo] + (params[lo + 1] - params[lo]) * t
}

fn needs_linear_fallback(points: &[Vector2]) -> bool {
    if points.len() < 3 {
        return true;
    }

    let spacings: Vec<f64> = points.windows(2).map(|w| w[0].distance(w[1])).collect();
    let mean = spacings.iter().sum::<f64>() / spacings.len() as f64;
    if mean <= 0.0 || spacings.iter().any(|&s| s < MIN_SPACING_RATIO * mean) {
        return true;
    }

    let first = points[0];
    let chord = points[points.len() - 1] - first;
    let chord_len = chord.magnitude();
    if chord_len <= 0.0 {
        return false;
    }
    let direction = chord / chord_len;
    points
        .iter()
        .all(|&p| direction.cross(p - first).abs() <= COLLINEAR_RATIO * chord_len)
}

/// Natural cubic spline with unit knot spacing, solved per coordinate with
/// the Thomas algorithm.
fn natural_cubic_segments(points: &[Vector2]) -> Vec<Segment> {
    let n = points.len();
    // Second derivatives at the knots; zero at both ends.
    let mut m = vec![Vector2::ZERO; n];

    let interior = n - 2;
    let mut c_prime = vec![0.0; interior];
    let mut d_prime = vec![Vector2::ZERO; interior];
    for k in 0..interior {
        let i = k + 1;
        let rhs = (points[i + 1] - points[i] * 2.0 + points[i - 1]) * 6.0;
        if k == 0 {
            c_prime[k] = 1.0 / 4.0;
            d_prime[k] = rhs / 4.0;
        } else {
            let denom = 4.0 - c_prime[k - 1];
            c_prime[k] = 1.0 / denom;
            d_prime[k] = (rhs - d_prime[k - 1]) / denom;
        }
    }
    for k in (0..interior).rev() {
        let next = if k + 1 < interior {
            m[k + 2]
        } else {
            Vector2::ZERO
        };
        m[k + 1] = d_prime[k] - next * c_prime[k];
    }

    points
        .windows(2)
        .enumerate()
        .map(|(i, w)| Segment {
            a: w[0],
            b: w[1] - w[0] - (m[i] * 2.0 + m[i + 1]) / 6.0,
            c: m[i] / 2.0,
            d: (m[i + 1] - m[i]) / 6.0,
        })
        .collect()
}
