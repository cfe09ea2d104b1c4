//! Planar geometry used by the pad engine.
//!
//! All coordinates are in internal units (nanometres) carried as `f64`.
//! Angles are in degrees, counter-clockwise positive.
//!
//! - [`bbox`] - axis-aligned bounding boxes
//! - [`shape`] - analytic shapes (circle, capsule, rectangle, polygon)
//! - [`polygon`] - polygon sets built from shapes at a given arc error

pub mod bbox;
pub mod polygon;
pub mod shape;

pub use bbox::BoundingBox;
pub use polygon::{ErrorLoc, PolygonSet};
pub use shape::{CompoundShape, Shape};

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Internal units per millimetre.
pub const IU_PER_MM: f64 = 1_000_000.0;

/// Internal units per mil (thousandth of an inch).
pub const IU_PER_MIL: f64 = 25_400.0;

/// Converts millimetres to internal units.
#[must_use]
pub fn mm_to_iu(mm: f64) -> f64 {
    mm * IU_PER_MM
}

/// Converts mils to internal units.
#[must_use]
pub fn mils_to_iu(mils: f64) -> f64 {
    mils * IU_PER_MIL
}

/// Converts internal units to millimetres.
#[must_use]
pub fn iu_to_mm(iu: f64) -> f64 {
    iu / IU_PER_MM
}

/// Converts internal units to mils.
#[must_use]
pub fn iu_to_mils(iu: f64) -> f64 {
    iu / IU_PER_MIL
}

/// A 2D point or vector in internal units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Squared Euclidean length of the vector.
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.x.mul_add(self.x, self.y * self.y)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).norm()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Z component of the cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x.mul_add(other.y, -(self.y * other.x))
    }

    /// Rotates the vector about the origin.
    #[must_use]
    pub fn rotate(self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self;
        }

        // Exact results for the common right angles keep axis-aligned
        // rectangles axis-aligned after rotation.
        let normalized = degrees.rem_euclid(360.0);
        if normalized == 0.0 {
            return self;
        } else if normalized == 90.0 {
            return Self::new(-self.y, self.x);
        } else if normalized == 180.0 {
            return Self::new(-self.x, -self.y);
        } else if normalized == 270.0 {
            return Self::new(self.y, -self.x);
        }

        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            self.x.mul_add(cos, -(self.y * sin)),
            self.x.mul_add(sin, self.y * cos),
        )
    }

    /// Rotates the point about `center`.
    #[must_use]
    pub fn rotate_about(self, center: Self, degrees: f64) -> Self {
        (self - center).rotate(degrees) + center
    }

    /// Mirrors the point about the vertical line `x = axis_x`.
    #[must_use]
    pub fn mirror_x(self, axis_x: f64) -> Self {
        Self::new(2.0f64.mul_add(axis_x, -self.x), self.y)
    }

    /// Returns the unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.norm();
        if len == 0.0 {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Perpendicular vector (rotated 90° counter-clockwise).
    #[must_use]
    pub const fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Returns true when segments `a1`-`a2` and `b1`-`b2` intersect (touching counts).
#[must_use]
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = (a2 - a1).cross(b1 - a1);
    let d2 = (a2 - a1).cross(b2 - a1);
    let d3 = (b2 - b1).cross(a1 - b1);
    let d4 = (b2 - b1).cross(a2 - b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };

    (d1 == 0.0 && on_segment(a1, a2, b1))
        || (d2 == 0.0 && on_segment(a1, a2, b2))
        || (d3 == 0.0 && on_segment(b1, b2, a1))
        || (d4 == 0.0 && on_segment(b1, b2, a2))
}

/// Shortest distance between segments `a1`-`a2` and `b1`-`b2`.
#[must_use]
pub fn segment_to_segment_distance(a1: Point, a2: Point, b1: Point, b2: Point) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    distance_to_segment(a1, b1, b2)
        .min(distance_to_segment(a2, b1, b2))
        .min(distance_to_segment(b1, a1, a2))
        .min(distance_to_segment(b2, a1, a2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn unit_conversions() {
        assert!(approx_eq(mils_to_iu(60.0), 1_524_000.0));
        assert!(approx_eq(mm_to_iu(1.5), 1_500_000.0));
        assert!(approx_eq(iu_to_mils(mils_to_iu(42.0)), 42.0));
        assert!(approx_eq(iu_to_mm(mm_to_iu(0.25)), 0.25));
    }

    #[test]
    fn right_angle_rotation_is_exact() {
        let p = Point::new(3.0, 1.0);
        assert_eq!(p.rotate(90.0), Point::new(-1.0, 3.0));
        assert_eq!(p.rotate(-90.0), Point::new(1.0, -3.0));
        assert_eq!(p.rotate(180.0), Point::new(-3.0, -1.0));
        assert_eq!(p.rotate(720.0), p);
    }

    #[test]
    fn arbitrary_rotation() {
        let p = Point::new(1.0, 0.0).rotate(45.0);
        assert!(approx_eq(p.x, std::f64::consts::FRAC_1_SQRT_2));
        assert!(approx_eq(p.y, std::f64::consts::FRAC_1_SQRT_2));
    }

    #[test]
    fn segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(approx_eq(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0));
        assert!(approx_eq(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0));
        assert!(approx_eq(distance_to_segment(Point::new(1.0, 1.0), a, a), 2f64.sqrt()));
    }

    #[test]
    fn crossing_segments() {
        assert!(segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0)
        ));
        assert!(!segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0)
        ));
        assert!(approx_eq(
            segment_to_segment_distance(
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0)
            ),
            1.0
        ));
    }
}
