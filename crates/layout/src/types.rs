use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 2D point or vector. All operations return new values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, v: f64) -> Vector2 {
        Vector2::new(self.x * v, self.y * v)
    }

    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    pub fn normalize(self) -> Vector2 {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            Vector2::ZERO
        } else {
            Vector2::new(self.x / magnitude, self.y / magnitude)
        }
    }

    pub fn distance_to(self, other: Vector2) -> f64 {
        other.sub(self).magnitude()
    }

    /// Raw (unnormalized) vector from `self` to `other`.
    pub fn vector_to(self, other: Vector2) -> Vector2 {
        other.sub(self)
    }

    /// Unit vector pointing from `self` towards `other`.
    pub fn direction_to(self, other: Vector2) -> Vector2 {
        self.vector_to(other).normalize()
    }

    pub fn midpoint(self, other: Vector2) -> Vector2 {
        Vector2::new(
            other.x + (self.x - other.x) / 2.0,
            other.y + (self.y - other.y) / 2.0,
        )
    }

    /// Shortest distance from this point to the segment `a`..`b`.
    pub fn distance_to_segment(self, a: Vector2, b: Vector2) -> f64 {
        let ab = a.vector_to(b);
        let len2 = ab.x * ab.x + ab.y * ab.y;
        if len2 == 0.0 {
            return self.distance_to(a);
        }
        let ap = a.vector_to(self);
        let t = ((ap.x * ab.x + ap.y * ab.y) / len2).clamp(0.0, 1.0);
        self.distance_to(a.add(ab.scale(t)))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::add(self, rhs)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        *self = Vector2::add(*self, rhs);
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
        self.scale(-1.0)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Fixed drawing area. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn centre(&self) -> Vector2 {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Caller-assigned node identity, unique within a graph.
pub type NodeId = u32;
