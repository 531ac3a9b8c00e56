use super::math::Vector2;

/// Relative determinant below which three samples count as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// Local circle of curvature fitted through three nearby curve samples.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Curvature {
    /// Radius of the fitted circle; infinite on straight stretches.
    pub radius: f64,
    /// Center of the fitted circle, `None` when the samples are collinear.
    pub center: Option<Vector2>,
}

impl Curvature {
    pub const fn new(radius: f64, center: Option<Vector2>) -> Self {
        Self { radius, center }
    }

    pub const ZERO: Self = Self::new(f64::INFINITY, None);

    /// Fits the circle through `a`, `b`, `c` with the centroid method.
    ///
    /// Coordinates are shifted to the centroid, then the algebraic circle
    /// equation is solved through its 2x2 normal equations. Numerically
    /// collinear samples give [`Curvature::ZERO`].
    pub fn fit(a: Vector2, b: Vector2, c: Vector2) -> Self {
        let points = [a, b, c];
        let centroid = (a + b + c) / 3.0;

        let (mut suu, mut suv, mut svv) = (0.0, 0.0, 0.0);
        let (mut suuu, mut svvv, mut suvv, mut svuu) = (0.0, 0.0, 0.0, 0.0);
        for p in points {
            let u = p.x - centroid.x;
            let v = p.y - centroid.y;
            suu += u * u;
            suv += u * v;
            svv += v * v;
            suuu += u * u * u;
            svvv += v * v * v;
            suvv += u * v * v;
            svuu += v * u * u;
        }

        let det = suu * svv - suv * suv;
        let spread = suu + svv;
        let scale = spread * spread;
        if !(det.is_finite() && scale > 0.0) || det <= COLLINEAR_TOLERANCE * scale {
            return Self::ZERO;
        }

        let rhs_u = 0.5 * (suuu + suvv);
        let rhs_v = 0.5 * (svvv + svuu);
        let uc = (rhs_u * svv - rhs_v * suv) / det;
        let vc = (suu * rhs_v - suv * rhs_u) / det;

        let radius = (uc * uc + vc * vc + spread / 3.0).sqrt();
        if !radius.is_finite() {
            return Self::ZERO;
        }

        Self::new(radius, Some(Vector2::new(centroid.x + uc, centroid.y + vc)))
    }

    pub fn is_flat(&self) -> bool {
        self.center.is_none()
    }

    /// Unit vector from `from` toward the center of curvature, zero when flat.
    pub fn toward_center(&self, from: Vector2) -> Vector2 {
        match self.center {
            Some(center) => (center - from).normalize(),
            None => Vector2::ZERO,
        }
    }

    /// Curvature `1/R`, positive when the center lies on the `normal` side of `at`.
    pub fn signed(&self, at: Vector2, normal: Vector2) -> f64 {
        match self.center {
            Some(center) => {
                let side = (center - at).dot(normal);
                if side >= 0.0 {
                    1.0 / self.radius
                } else {
                    -1.0 / self.radius
                }
            }
            None => 0.0,
        }
    }
}

impl Default for Curvature {
    fn default() -> Self {
        Self::ZERO
    }
}
