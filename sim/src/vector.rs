//! Two-component vector used for positions, sizes and velocities.
//!
//! Plain `Copy` value type. Serializes as a `[x, y]` array so snapshots stay
//! compact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// 2D vector of `f64` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector with both components set to `value`.
    pub const fn splat(value: f64) -> Self {
        Self { x: value, y: value }
    }

    /// Vector magnitude.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(&self, other: Vector) -> f64 {
        (*self - other).length()
    }

    /// Scale to unit length in place. A zero vector stays zero.
    pub fn normalize(&mut self) {
        let length = self.length();
        if length != 0.0 {
            self.x /= length;
            self.y /= length;
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Limit the magnitude to `max`, keeping the direction.
    pub fn clamp(&mut self, max: f64) {
        if self.length() > max {
            self.normalize();
            *self *= max;
        }
    }

    pub fn opposite(&self) -> Self {
        -*self
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl From<[f64; 2]> for Vector {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Vector> for [f64; 2] {
    fn from(v: Vector) -> Self {
        [v.x, v.y]
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, scalar: f64) -> Vector {
        Vector::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    fn div(self, scalar: f64) -> Vector {
        self * (1.0 / scalar)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f64> for Vector {
    fn mul_assign(&mut self, scalar: f64) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

impl DivAssign<f64> for Vector {
    fn div_assign(&mut self, scalar: f64) {
        *self *= 1.0 / scalar;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let v = Vector::new(3.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        let mut v = Vector::ZERO;
        v.normalize();
        assert_eq!(v, Vector::ZERO);
    }

    #[test]
    fn test_clamp_only_shrinks() {
        let mut long = Vector::new(3000.0, 4000.0);
        long.clamp(1000.0);
        assert!((long.length() - 1000.0).abs() < 1e-9);
        assert!((long.x - 600.0).abs() < 1e-9);

        let mut short = Vector::new(1.0, 1.0);
        short.clamp(1000.0);
        assert_eq!(short, Vector::new(1.0, 1.0));
    }

    #[test]
    fn test_dot_and_distance() {
        let a = Vector::new(1.0, 2.0);
        let b = Vector::new(4.0, 6.0);
        assert_eq!(a.dot(b), 16.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.opposite(), Vector::new(-1.0, -2.0));
    }

    #[test]
    fn test_display_and_json() {
        let v = Vector::new(1.0, -2.5);
        assert_eq!(v.to_string(), "(1.00, -2.50)");
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,-2.5]");
        let back: Vector = serde_json::from_str("[1.0,-2.5]").unwrap();
        assert_eq!(back, v);
    }
}
