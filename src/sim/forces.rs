use super::math::Vector2;

/// Contact forces on a grounded rider, in newtons.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Forces {
    /// Signed normal force the track must supply along the rider's side.
    /// Negative means the track would have to pull, so the rider leaves it.
    pub normal: f64,
    /// Tangential component of gravity along the unit tangent.
    pub tangential: f64,
}

impl Forces {
    pub const fn new(normal: f64, tangential: f64) -> Self {
        Self { normal, tangential }
    }

    /// Solves the constraint equation perpendicular to the curve.
    ///
    /// * `signed_curvature` - `1/R`, positive toward `unit_normal`
    /// * `unit_normal` - left normal of the curve at the rider
    /// * `unit_tangent` - direction of increasing path parameter
    /// * `side` - `+1.0` when the rider sits on the `unit_normal` side, else `-1.0`
    pub fn compute(
        signed_curvature: f64,
        unit_tangent: Vector2,
        unit_normal: Vector2,
        side: f64,
        speed: f64,
        mass: f64,
        gravity: f64,
    ) -> Self {
        let centripetal = signed_curvature * speed * speed;
        let normal = side * mass * (centripetal + gravity * unit_normal.y);
        let tangential = -mass * gravity * unit_tangent.y;
        Self::new(normal, tangential)
    }

    /// Whether the track can keep the rider on the curve.
    pub fn keeps_contact(&self) -> bool {
        self.normal >= 0.0
    }

    /// Magnitude of sliding friction for coefficient `friction`.
    pub fn friction(&self, friction: f64) -> f64 {
        friction * self.normal.abs()
    }

    /// Whether static friction can hold a rider at rest against gravity.
    pub fn static_friction_holds(&self, friction: f64) -> bool {
        self.tangential.abs() <= self.friction(friction)
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);
}

impl Default for Forces {
    fn default() -> Self {
        Self::ZERO
    }
}
