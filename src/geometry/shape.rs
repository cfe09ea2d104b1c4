//! Analytic shapes.
//!
//! These are the exact outlines the pad engine hands to consumers. They are
//! cheap to collide against and are converted to polygons only when a
//! consumer needs boolean operations.

use std::f64::consts::PI;

use super::{distance_to_segment, segment_to_segment_distance, BoundingBox, Point};

/// A single analytic shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled circle.
    Circle {
        /// Centre.
        center: Point,
        /// Radius.
        radius: f64,
    },
    /// Capsule: a segment swept by a disc of diameter `width`.
    Segment {
        /// First endpoint.
        start: Point,
        /// Second endpoint.
        end: Point,
        /// Total width (twice the end cap radius).
        width: f64,
    },
    /// Axis-aligned filled rectangle.
    Rect {
        /// Minimum corner.
        origin: Point,
        /// Extent along X.
        width: f64,
        /// Extent along Y.
        height: f64,
    },
    /// Filled simple polygon. The outline is implicitly closed.
    Polygon {
        /// Outline vertices.
        points: Vec<Point>,
    },
}

impl Shape {
    /// Short name of the variant, for logs and reports.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Segment { .. } => "segment",
            Self::Rect { .. } => "rect",
            Self::Polygon { .. } => "polygon",
        }
    }

    /// Bounding box of the shape.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        match self {
            Self::Circle { center, radius } => {
                BoundingBox::from_center(*center, radius * 2.0, radius * 2.0)
            }
            Self::Segment { start, end, width } => {
                BoundingBox::from_corners(*start, *end).inflated(width / 2.0)
            }
            Self::Rect {
                origin,
                width,
                height,
            } => BoundingBox::from_corners(*origin, Point::new(origin.x + width, origin.y + height)),
            Self::Polygon { points } => BoundingBox::from_points(points.iter().copied()),
        }
    }

    /// Area enclosed by the shape.
    #[must_use]
    pub fn area(&self) -> f64 {
        match self {
            Self::Circle { radius, .. } => PI * radius * radius,
            Self::Segment { start, end, width } => {
                let r = width / 2.0;
                start.distance(*end).mul_add(*width, PI * r * r)
            }
            Self::Rect { width, height, .. } => (width * height).abs(),
            Self::Polygon { points } => ring_area(points).abs(),
        }
    }

    /// Moves the shape by `delta`.
    #[must_use]
    pub fn translated(self, delta: Point) -> Self {
        match self {
            Self::Circle { center, radius } => Self::Circle {
                center: center + delta,
                radius,
            },
            Self::Segment { start, end, width } => Self::Segment {
                start: start + delta,
                end: end + delta,
                width,
            },
            Self::Rect {
                origin,
                width,
                height,
            } => Self::Rect {
                origin: origin + delta,
                width,
                height,
            },
            Self::Polygon { points } => Self::Polygon {
                points: points.into_iter().map(|p| p + delta).collect(),
            },
        }
    }

    /// Rotates the shape about `center`.
    ///
    /// Rectangles stay rectangles for multiples of 90°, and become polygons
    /// otherwise.
    #[must_use]
    pub fn rotated(self, center: Point, degrees: f64) -> Self {
        if degrees.rem_euclid(360.0) == 0.0 {
            return self;
        }
        match self {
            Self::Circle { center: c, radius } => Self::Circle {
                center: c.rotate_about(center, degrees),
                radius,
            },
            Self::Segment { start, end, width } => Self::Segment {
                start: start.rotate_about(center, degrees),
                end: end.rotate_about(center, degrees),
                width,
            },
            Self::Rect {
                origin,
                width,
                height,
            } => {
                let corners = BoundingBox::from_corners(
                    origin,
                    Point::new(origin.x + width, origin.y + height),
                )
                .corners()
                .map(|p| p.rotate_about(center, degrees));
                rect_or_polygon(corners)
            }
            Self::Polygon { points } => Self::Polygon {
                points: points
                    .into_iter()
                    .map(|p| p.rotate_about(center, degrees))
                    .collect(),
            },
        }
    }

    /// Mirrors the shape about the vertical line `x = axis_x`.
    #[must_use]
    pub fn mirrored_x(self, axis_x: f64) -> Self {
        match self {
            Self::Circle { center, radius } => Self::Circle {
                center: center.mirror_x(axis_x),
                radius,
            },
            Self::Segment { start, end, width } => Self::Segment {
                start: start.mirror_x(axis_x),
                end: end.mirror_x(axis_x),
                width,
            },
            Self::Rect {
                origin,
                width,
                height,
            } => Self::Rect {
                origin: Point::new(2.0f64.mul_add(axis_x, -origin.x) - width, origin.y),
                width,
                height,
            },
            Self::Polygon { points } => Self::Polygon {
                points: points.into_iter().rev().map(|p| p.mirror_x(axis_x)).collect(),
            },
        }
    }

    /// Distance from `p` to the shape outline, zero when `p` is inside.
    #[must_use]
    pub fn distance_to(&self, p: Point) -> f64 {
        match self {
            Self::Circle { center, radius } => (p.distance(*center) - radius).max(0.0),
            Self::Segment { start, end, width } => {
                (distance_to_segment(p, *start, *end) - width / 2.0).max(0.0)
            }
            Self::Rect { .. } => self.bbox().distance_to_point(p),
            Self::Polygon { points } => {
                if point_in_ring(p, points) {
                    0.0
                } else {
                    ring_edges(points)
                        .map(|(a, b)| distance_to_segment(p, a, b))
                        .fold(f64::INFINITY, f64::min)
                }
            }
        }
    }

    /// Returns true when `p` is inside the shape or within `accuracy` of it.
    #[must_use]
    pub fn collide_point(&self, p: Point, accuracy: f64) -> bool {
        self.distance_to(p) <= accuracy
    }

    /// Returns true when the shape touches the rectangle.
    #[must_use]
    pub fn collide_rect(&self, rect: &BoundingBox) -> bool {
        if !self.bbox().intersects(rect) {
            return false;
        }
        match self {
            Self::Circle { center, radius } => rect.distance_to_point(*center) <= *radius,
            Self::Segment { start, end, width } => {
                if rect.intersects_segment(*start, *end) {
                    return true;
                }
                let c = rect.corners();
                (0..4)
                    .map(|i| segment_to_segment_distance(*start, *end, c[i], c[(i + 1) % 4]))
                    .fold(f64::INFINITY, f64::min)
                    <= width / 2.0
            }
            Self::Rect { .. } => true,
            Self::Polygon { points } => {
                points.iter().any(|p| rect.contains_point(*p))
                    || ring_edges(points).any(|(a, b)| rect.intersects_segment(a, b))
                    || point_in_ring(rect.center(), points)
            }
        }
    }
}

/// Builds a [`Shape::Rect`] when the four corners form an axis-aligned
/// rectangle, and a [`Shape::Polygon`] otherwise.
#[must_use]
pub fn rect_or_polygon(corners: [Point; 4]) -> Shape {
    let [c0, c1, c2, c3] = corners;
    #[allow(clippy::float_cmp)]
    let axis_aligned = (c0.y == c1.y && c1.x == c2.x && c2.y == c3.y && c3.x == c0.x)
        || (c0.x == c1.x && c1.y == c2.y && c2.x == c3.x && c3.y == c0.y);

    if axis_aligned {
        let bbox = BoundingBox::from_points(corners);
        Shape::Rect {
            origin: Point::new(bbox.min_x, bbox.min_y),
            width: bbox.width(),
            height: bbox.height(),
        }
    } else {
        Shape::Polygon {
            points: corners.to_vec(),
        }
    }
}

/// Signed area of a closed ring (positive when counter-clockwise).
#[must_use]
pub fn ring_area(points: &[Point]) -> f64 {
    ring_edges(points).map(|(a, b)| a.cross(b)).sum::<f64>() / 2.0
}

/// Iterates the edges of a closed ring, including the closing edge.
pub fn ring_edges(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

/// Even-odd point in ring test.
///
/// Zero-width bridges produced by fracturing are crossed twice and cancel
/// out, so fractured outlines test correctly.
#[must_use]
pub fn point_in_ring(p: Point, points: &[Point]) -> bool {
    let mut inside = false;
    for (a, b) in ring_edges(points) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x).mul_add((p.y - a.y) / (b.y - a.y), a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// An ordered collection of shapes treated as their union.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundShape {
    shapes: Vec<Shape>,
}

impl CompoundShape {
    /// Creates an empty compound shape.
    #[must_use]
    pub const fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Adds a shape.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// The member shapes.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Number of member shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true when there are no member shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Merged bounding box of all member shapes.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        for shape in &self.shapes {
            bbox.merge(&shape.bbox());
        }
        bbox
    }

    /// Returns true when `p` is within `accuracy` of any member.
    #[must_use]
    pub fn collide_point(&self, p: Point, accuracy: f64) -> bool {
        self.shapes.iter().any(|s| s.collide_point(p, accuracy))
    }

    /// Returns true when any member touches the rectangle.
    #[must_use]
    pub fn collide_rect(&self, rect: &BoundingBox) -> bool {
        self.shapes.iter().any(|s| s.collide_rect(rect))
    }
}

impl FromIterator<Shape> for CompoundShape {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}
