//! 2D vector math for the arena simulation

use std::ops::{Add, Mul, Neg, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Immutable 2D vector. Every operation returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector pointing along `angle` with the given length
    pub fn from_angle(angle: f64, magnitude: f64) -> Self {
        Self::new(angle.cos() * magnitude, angle.sin() * magnitude)
    }

    /// Random unit vector. Not used on deterministic simulation paths.
    pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        Self::from_angle(angle, 1.0)
    }

    pub fn add(self, other: Vector2) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vector2) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }

    /// Divide by a scalar. Division by zero saturates to the zero vector.
    pub fn div(self, scalar: f64) -> Self {
        if scalar == 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / scalar, self.y / scalar)
    }

    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction (zero stays zero)
    pub fn normalize(self) -> Self {
        self.div(self.magnitude())
    }

    /// Clamp the magnitude to `max`
    pub fn limit(self, max: f64) -> Self {
        if self.magnitude() > max {
            return self.normalize().scale(max);
        }
        self
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(self, other: Vector2) -> f64 {
        self.sub(other).magnitude()
    }

    /// Heading of the vector in radians, atan2(y, x)
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::add(self, rhs)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::sub(self, rhs)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        self.scale(rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}
