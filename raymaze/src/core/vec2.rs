//! 2D Vector
//!
//! Grid-space vector math for movement, rays and sprite projection.
//! One unit is one grid cell.

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 2D vector in grid units.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component (columns, grows to the right)
    pub x: f64,
    /// Y component (rows, grows downward)
    pub y: f64,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Squared length (prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Normalize to unit length. The zero vector stays zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self.scale(1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Heading (radians) of the direction from `self` to `target`.
    #[inline]
    pub fn angle_to(self, target: Self) -> f64 {
        let d = target - self;
        d.y.atan2(d.x)
    }

    /// Grid cell containing this point.
    #[inline]
    pub fn cell(self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        self.scale(scalar)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.3}, {:.3})", self.x, self.y)
    }
}

/// Wrap an angle into (-π, π].
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    a
}

/// Signed angle of `target` relative to a viewer at `origin` facing `facing`,
/// wrapped into (-π, π].
#[inline]
pub fn relative_angle(origin: Vec2, facing: f64, target: Vec2) -> f64 {
    normalize_angle(origin.angle_to(target) - facing)
}
