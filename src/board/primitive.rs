//! Custom pad primitives.
//!
//! Primitives are stored in the pad's unrotated frame, relative to the shape
//! position. Each one expands into analytic [`Shape`]s, which the shape
//! builder rotates and moves onto the board.

use serde::{Deserialize, Serialize};

use crate::geometry::polygon::{arc_to_segment_count, ArcApprox};
use crate::geometry::shape::ring_edges;
use crate::geometry::{BoundingBox, ErrorLoc, Point, PolygonSet, Shape};

/// Number of chords used to flatten a cubic Bézier curve.
pub const BEZIER_SEGMENTS: usize = 16;

/// Geometry of a primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimitiveGeometry {
    /// Straight line.
    Segment {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },
    /// Axis-aligned rectangle between two corners.
    Rect {
        /// First corner.
        start: Point,
        /// Opposite corner.
        end: Point,
        /// Corner radius of a filled rectangle.
        #[serde(default)]
        corner_radius: f64,
    },
    /// Circular arc.
    Arc {
        /// Arc centre.
        center: Point,
        /// Start point; the radius is its distance to the centre.
        start: Point,
        /// Sweep in degrees, counter-clockwise positive.
        angle: f64,
    },
    /// Circle or ring.
    Circle {
        /// Centre.
        center: Point,
        /// Radius to the middle of the line.
        radius: f64,
    },
    /// Cubic Bézier curve.
    Bezier {
        /// Start point.
        start: Point,
        /// First control point.
        control1: Point,
        /// Second control point.
        control2: Point,
        /// End point.
        end: Point,
    },
    /// Closed polygon.
    Polygon {
        /// Outline vertices.
        points: Vec<Point>,
    },
}

/// One building block of a custom pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Geometry.
    #[serde(flatten)]
    pub geometry: PrimitiveGeometry,
    /// Line width. Filled closed shapes grow by half of it.
    #[serde(default)]
    pub width: f64,
    /// Whether closed shapes are filled.
    #[serde(default = "default_filled")]
    pub filled: bool,
}

const fn default_filled() -> bool {
    true
}

impl Primitive {
    /// Creates a primitive.
    #[must_use]
    pub const fn new(geometry: PrimitiveGeometry, width: f64, filled: bool) -> Self {
        Self {
            geometry,
            width,
            filled,
        }
    }

    /// A line segment of `width`.
    #[must_use]
    pub const fn segment(start: Point, end: Point, width: f64) -> Self {
        Self::new(PrimitiveGeometry::Segment { start, end }, width, false)
    }

    /// A filled circle.
    #[must_use]
    pub const fn filled_circle(center: Point, radius: f64) -> Self {
        Self::new(PrimitiveGeometry::Circle { center, radius }, 0.0, true)
    }

    /// A filled polygon.
    #[must_use]
    pub const fn filled_polygon(points: Vec<Point>) -> Self {
        Self::new(PrimitiveGeometry::Polygon { points }, 0.0, true)
    }

    /// A filled rectangle between two corners.
    #[must_use]
    pub const fn filled_rect(start: Point, end: Point) -> Self {
        Self::new(
            PrimitiveGeometry::Rect {
                start,
                end,
                corner_radius: 0.0,
            },
            0.0,
            true,
        )
    }

    /// Expands the primitive into analytic shapes.
    ///
    /// Curves are flattened into capsules with at most `max_error` deviation.
    #[must_use]
    pub fn effective_shapes(&self, max_error: f64) -> Vec<Shape> {
        let width = self.width.max(0.0);
        let stroke = |points: &[Point], closed: bool| -> Vec<Shape> {
            let mut shapes: Vec<Shape> = points
                .windows(2)
                .map(|w| Shape::Segment {
                    start: w[0],
                    end: w[1],
                    width,
                })
                .collect();
            if closed && points.len() > 2 {
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    shapes.push(Shape::Segment {
                        start: *last,
                        end: *first,
                        width,
                    });
                }
            }
            shapes
        };

        match &self.geometry {
            PrimitiveGeometry::Segment { start, end } => vec![Shape::Segment {
                start: *start,
                end: *end,
                width,
            }],
            PrimitiveGeometry::Rect {
                start,
                end,
                corner_radius,
            } => {
                let bbox = BoundingBox::from_corners(*start, *end);
                let corners = bbox.corners();
                let mut shapes = Vec::new();
                if self.filled {
                    if *corner_radius > 0.0 {
                        let outline = PolygonSet::round_chamfered_rect(
                            bbox.center(),
                            Point::new(bbox.width(), bbox.height()),
                            0.0,
                            *corner_radius,
                            0.0,
                            [false; 4],
                            0.0,
                            ArcApprox::new(max_error, ErrorLoc::Inside),
                        );
                        shapes.extend(
                            outline
                                .outlines()
                                .into_iter()
                                .map(|points| Shape::Polygon { points }),
                        );
                    } else {
                        shapes.push(Shape::Rect {
                            origin: Point::new(bbox.min_x, bbox.min_y),
                            width: bbox.width(),
                            height: bbox.height(),
                        });
                    }
                }
                if width > 0.0 || !self.filled {
                    shapes.extend(stroke(&corners, true));
                }
                shapes
            }
            PrimitiveGeometry::Arc {
                center,
                start,
                angle,
            } => stroke(&arc_points(*center, *start, *angle, max_error), false),
            PrimitiveGeometry::Circle { center, radius } => {
                if self.filled {
                    vec![Shape::Circle {
                        center: *center,
                        radius: radius + width / 2.0,
                    }]
                } else {
                    let start = Point::new(center.x + radius, center.y);
                    stroke(&arc_points(*center, start, 360.0, max_error), false)
                }
            }
            PrimitiveGeometry::Bezier {
                start,
                control1,
                control2,
                end,
            } => stroke(&bezier_points(*start, *control1, *control2, *end), false),
            PrimitiveGeometry::Polygon { points } => {
                let mut shapes = Vec::new();
                if self.filled && points.len() >= 3 {
                    shapes.push(Shape::Polygon {
                        points: points.clone(),
                    });
                }
                if width > 0.0 || !self.filled {
                    shapes.extend(ring_edges(points).map(|(a, b)| Shape::Segment {
                        start: a,
                        end: b,
                        width,
                    }));
                }
                shapes
            }
        }
    }

    /// Union of the primitive's shapes as a polygon set.
    #[must_use]
    pub fn to_polygon(&self, approx: ArcApprox) -> PolygonSet {
        self.effective_shapes(approx.max_error)
            .iter()
            .fold(PolygonSet::new(), |acc, shape| {
                acc.union(&PolygonSet::from_shape(shape, 0.0, approx))
            })
    }

    /// Bounding box of the primitive, line width included.
    #[must_use]
    pub fn bbox(&self, max_error: f64) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        for shape in self.effective_shapes(max_error) {
            bbox.merge(&shape.bbox());
        }
        bbox
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        match &mut self.geometry {
            PrimitiveGeometry::Segment { start, end }
            | PrimitiveGeometry::Rect { start, end, .. } => {
                *start = f(*start);
                *end = f(*end);
            }
            PrimitiveGeometry::Arc { center, start, .. } => {
                *center = f(*center);
                *start = f(*start);
            }
            PrimitiveGeometry::Circle { center, .. } => *center = f(*center),
            PrimitiveGeometry::Bezier {
                start,
                control1,
                control2,
                end,
            } => {
                for p in [start, control1, control2, end] {
                    *p = f(*p);
                }
            }
            PrimitiveGeometry::Polygon { points } => {
                for p in points.iter_mut() {
                    *p = f(*p);
                }
            }
        }
    }

    /// Moves the primitive.
    pub fn move_by(&mut self, delta: Point) {
        self.map_points(|p| p + delta);
    }

    /// Rotates the primitive about `center`.
    ///
    /// Rectangles turned by anything other than a right angle become
    /// polygons.
    pub fn rotate(&mut self, center: Point, degrees: f64) {
        if let PrimitiveGeometry::Rect {
            start,
            end,
            corner_radius,
        } = &self.geometry
        {
            if degrees.rem_euclid(90.0) != 0.0 && *corner_radius == 0.0 {
                let corners = BoundingBox::from_corners(*start, *end).corners().to_vec();
                self.geometry = PrimitiveGeometry::Polygon { points: corners };
            }
        }
        self.map_points(|p| p.rotate_about(center, degrees));
    }

    /// Mirrors the primitive about the vertical line `x = axis_x`.
    pub fn mirror_x(&mut self, axis_x: f64) {
        self.map_points(|p| p.mirror_x(axis_x));
        match &mut self.geometry {
            PrimitiveGeometry::Arc { angle, .. } => *angle = -*angle,
            PrimitiveGeometry::Polygon { points } => points.reverse(),
            _ => {}
        }
    }
}

/// Points along an arc from `start` about `center`, sweeping `angle` degrees.
fn arc_points(center: Point, start: Point, angle: f64, max_error: f64) -> Vec<Point> {
    let radius = start.distance(center);
    let count = arc_to_segment_count(radius, max_error, angle);
    #[allow(clippy::cast_precision_loss)]
    let step = angle / count as f64;
    (0..=count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            start.rotate_about(center, step * i as f64)
        })
        .collect()
}

/// Points along a cubic Bézier curve.
fn bezier_points(p0: Point, p1: Point, p2: Point, p3: Point) -> Vec<Point> {
    (0..=BEZIER_SEGMENTS)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / BEZIER_SEGMENTS as f64;
            let u = 1.0 - t;
            p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
        })
        .collect()
}
