use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// 2D vector with f64 components, y pointing up.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0);
    pub const DOWN: Self = Self::new(0.0, -1.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0);

    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn magnitude_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < f64::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / mag)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; positive when `other` is
    /// counter-clockwise from `self`.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotates by +90 degrees.
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Vector2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Default for Vector2 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vector2_normalize() {
        let v = Vector2::new(3.0, 4.0);
        let normalized = v.normalize();
        assert_relative_eq!(normalized.x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(normalized.y, 0.8, epsilon = 1e-12);
        assert_relative_eq!(normalized.magnitude(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(Vector2::ZERO.normalize(), Vector2::ZERO);
    }

    #[test]
    fn test_cross_sign_follows_rotation() {
        assert_relative_eq!(Vector2::RIGHT.cross(Vector2::UP), 1.0, epsilon = 1e-12);
        assert_relative_eq!(Vector2::UP.cross(Vector2::RIGHT), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_perp_is_counter_clockwise() {
        let p = Vector2::RIGHT.perp();
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(Vector2::new(2.0, -1.0).dot(Vector2::new(2.0, -1.0).perp()), 0.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = Vector2::new(0.0, 0.0).lerp(Vector2::new(2.0, 4.0), 0.5);
        assert_relative_eq!(mid.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_is_finite_rejects_nan() {
        assert!(Vector2::new(1.0, 2.0).is_finite());
        assert!(!Vector2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vector2::new(0.0, f64::INFINITY).is_finite());
    }
}
