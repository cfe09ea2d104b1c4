//! Effective pad geometry.
//!
//! [`ShapeBuilder`] turns a padstack snapshot and a pad position into the
//! analytic shapes consumers collide against, and into polygon sets at a
//! given clearance and error bias. It holds no state and never fails: odd
//! parameters fall back to well-defined shapes and the validator reports
//! them.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::layer::PcbLayer;
use super::padstack::{DrillShape, PadShape, Padstack};
use crate::geometry::polygon::{trapezoid_corners, ArcApprox, DEFAULT_MIN_SEGMENTS_PER_CIRCLE};
use crate::geometry::shape::rect_or_polygon;
use crate::geometry::{BoundingBox, CompoundShape, ErrorLoc, Point, PolygonSet, Shape};

/// Below this reduced half-size a rounded rectangle side has collapsed.
pub const MIN_SEGMENT_LENGTH: f64 = 100.0;

/// Default maximum arc approximation error.
pub const DEFAULT_MAX_ERROR: f64 = 5_000.0;

/// Tolerances used when approximating curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySettings {
    /// Maximum chord deviation from true arcs.
    pub max_error: f64,
    /// Minimum segment count for full circles.
    pub min_segments_per_circle: usize,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            max_error: DEFAULT_MAX_ERROR,
            min_segments_per_circle: DEFAULT_MIN_SEGMENTS_PER_CIRCLE,
        }
    }
}

impl GeometrySettings {
    /// Arc approximation parameters for `bias`.
    #[must_use]
    pub const fn approx(&self, bias: ErrorLoc) -> ArcApprox {
        ArcApprox::new(self.max_error, bias).with_min_segments(self.min_segments_per_circle)
    }
}

/// Analytic shapes of every unique layer plus the hole.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveShapes {
    /// Shape per unique copper layer.
    pub per_layer: BTreeMap<PcbLayer, Arc<CompoundShape>>,
    /// Hole capsule, `None` without a drill.
    pub hole: Option<Arc<Shape>>,
    /// Bounding box of all layers and the hole.
    pub bbox: BoundingBox,
}

/// Polygon sets of every unique layer for one error bias.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPolygons {
    /// Polygon per unique copper layer.
    pub per_layer: BTreeMap<PcbLayer, Arc<PolygonSet>>,
    /// Largest distance from the pad position to any vertex, floored by
    /// half the larger drill dimension. Only computed for
    /// [`ErrorLoc::Outside`].
    pub bounding_radius: f64,
}

/// Builds pad geometry from a padstack placed at a position.
#[derive(Debug, Clone, Copy)]
pub struct ShapeBuilder<'a> {
    padstack: &'a Padstack,
    position: Point,
    settings: GeometrySettings,
}

impl<'a> ShapeBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub const fn new(padstack: &'a Padstack, position: Point, settings: GeometrySettings) -> Self {
        Self {
            padstack,
            position,
            settings,
        }
    }

    /// Centre of the outline on `layer`: the pad position plus the rotated
    /// shape offset.
    #[must_use]
    pub fn shape_pos(&self, layer: PcbLayer) -> Point {
        let offset = self.padstack.shape_props(layer).offset;
        self.position + offset.rotate(self.padstack.orientation())
    }

    /// Analytic outline of `layer`.
    #[must_use]
    pub fn layer_shape(&self, layer: PcbLayer) -> CompoundShape {
        let props = self.padstack.shape_props(layer);
        let orientation = self.padstack.orientation();
        let pos = self.shape_pos(layer);
        let size = props.size;
        let mut out = CompoundShape::new();

        let kind = match props.shape {
            PadShape::Custom => props.anchor_shape,
            other => other,
        };

        match kind {
            PadShape::Circle => out.push(Shape::Circle {
                center: pos,
                radius: size.x / 2.0,
            }),
            PadShape::Oval => {
                #[allow(clippy::float_cmp)]
                let round = size.x == size.y;
                if round {
                    out.push(Shape::Circle {
                        center: pos,
                        radius: size.x / 2.0,
                    });
                } else {
                    let half_width = size.x.min(size.y) / 2.0;
                    let half_len =
                        Point::new(size.x / 2.0 - half_width, size.y / 2.0 - half_width)
                            .rotate(orientation);
                    out.push(Shape::Segment {
                        start: pos - half_len,
                        end: pos + half_len,
                        width: half_width * 2.0,
                    });
                }
            }
            PadShape::Rect | PadShape::RoundRect | PadShape::Trapezoid | PadShape::Custom => {
                let radius = if kind == PadShape::RoundRect {
                    props.round_rect_radius()
                } else {
                    0.0
                };
                let half_delta = if kind == PadShape::Trapezoid {
                    props.trapezoid_delta * 0.5
                } else {
                    Point::ZERO
                };
                push_rect_shapes(&mut out, pos, size, orientation, radius, half_delta);
            }
            PadShape::ChamferedRect => {
                let outline = PolygonSet::round_chamfered_rect(
                    pos,
                    size,
                    orientation,
                    props.round_rect_radius(),
                    props.chamfer_ratio,
                    props.chamfer_positions.corner_flags(),
                    0.0,
                    self.settings.approx(ErrorLoc::Inside),
                );
                for points in outline.outlines() {
                    out.push(Shape::Polygon { points });
                }
            }
        }

        if props.shape == PadShape::Custom {
            for primitive in &self.padstack.copper_layer(layer).primitives {
                for shape in primitive.effective_shapes(self.settings.max_error) {
                    out.push(shape.rotated(Point::ZERO, orientation).translated(pos));
                }
            }
        }

        out
    }

    /// Hole capsule at the pad position, `None` without a drill.
    #[must_use]
    pub fn hole_shape(&self) -> Option<Shape> {
        let drill = self.padstack.drill();
        if !drill.is_drilled() {
            return None;
        }

        let half_size = drill.size * 0.5;
        let (half_width, half_len) = match drill.shape {
            DrillShape::Circle => (half_size.x, Point::ZERO),
            DrillShape::Oblong => {
                let half_width = half_size.x.min(half_size.y);
                (
                    half_width,
                    Point::new(half_size.x - half_width, half_size.y - half_width),
                )
            }
        };

        if half_len.norm() == 0.0 {
            return Some(Shape::Circle {
                center: self.position,
                radius: half_width,
            });
        }

        let half_len = half_len.rotate(self.padstack.orientation());
        Some(Shape::Segment {
            start: self.position - half_len,
            end: self.position + half_len,
            width: half_width * 2.0,
        })
    }

    /// Shapes of every unique layer, the hole and the overall bounding box.
    #[must_use]
    pub fn build_effective_shapes(&self) -> EffectiveShapes {
        let mut per_layer = BTreeMap::new();
        let mut bbox = BoundingBox::new();

        for layer in self.padstack.unique_layers() {
            let shape = self.layer_shape(layer);
            bbox.merge(&shape.bbox());
            per_layer.insert(layer, Arc::new(shape));
        }

        let hole = self.hole_shape();
        if let Some(hole) = &hole {
            bbox.merge(&hole.bbox());
        }

        tracing::trace!(layers = per_layer.len(), "Built effective pad shapes");

        EffectiveShapes {
            per_layer,
            hole: hole.map(Arc::new),
            bbox: bbox.inflated(1.0),
        }
    }

    /// Anchor and primitives of a custom pad merged into one polygon set,
    /// in the pad's unrotated frame centred on the shape position.
    #[must_use]
    pub fn merge_primitives_as_polygon(&self, layer: PcbLayer, bias: ErrorLoc) -> PolygonSet {
        let copper = self.padstack.copper_layer(layer);
        let size = copper.shape.size;
        let approx = self.settings.approx(bias);

        let anchor = match copper.shape.anchor_shape {
            PadShape::Rect => PolygonSet::from_outline(
                &BoundingBox::from_center(Point::ZERO, size.x, size.y).corners(),
            ),
            _ => PolygonSet::circle(Point::ZERO, size.x / 2.0, approx),
        };

        copper
            .primitives
            .iter()
            .fold(anchor, |acc, primitive| acc.union(&primitive.to_polygon(approx)))
    }

    /// Outline of `layer` grown by `clearance` as a polygon set.
    #[must_use]
    pub fn shape_to_polygon(&self, layer: PcbLayer, clearance: f64, bias: ErrorLoc) -> PolygonSet {
        let props = self.padstack.shape_props(layer);
        let orientation = self.padstack.orientation();
        let pos = self.shape_pos(layer);
        let size = props.size;
        let approx = self.settings.approx(bias);

        match props.shape {
            PadShape::Circle => PolygonSet::circle(pos, size.x / 2.0 + clearance, approx),
            PadShape::Oval => {
                let half_width = size.x.min(size.y) / 2.0;
                let delta = Point::new(size.x / 2.0 - half_width, size.y / 2.0 - half_width)
                    .rotate(orientation);
                PolygonSet::oval(pos - delta, pos + delta, (half_width + clearance) * 2.0, approx)
            }
            PadShape::Rect | PadShape::Trapezoid => {
                let half_delta = if props.shape == PadShape::Trapezoid {
                    props.trapezoid_delta * 0.5
                } else {
                    Point::ZERO
                };
                PolygonSet::trapezoid(pos, size, orientation, half_delta, clearance, approx)
            }
            PadShape::RoundRect | PadShape::ChamferedRect => {
                let chamfer = props.shape == PadShape::ChamferedRect;
                PolygonSet::round_chamfered_rect(
                    pos,
                    size,
                    orientation,
                    props.round_rect_radius(),
                    if chamfer { props.chamfer_ratio } else { 0.0 },
                    if chamfer {
                        props.chamfer_positions.corner_flags()
                    } else {
                        [false; 4]
                    },
                    clearance,
                    approx,
                )
            }
            PadShape::Custom => {
                let merged = self
                    .merge_primitives_as_polygon(layer, bias)
                    .rotated(Point::ZERO, orientation)
                    .translated(pos);
                if clearance == 0.0 {
                    merged
                } else {
                    merged.inflated(clearance, approx)
                }
            }
        }
    }

    /// Hole grown by `clearance` as a polygon set; empty without a drill.
    #[must_use]
    pub fn hole_to_polygon(&self, clearance: f64, bias: ErrorLoc) -> PolygonSet {
        self.hole_shape().map_or_else(PolygonSet::new, |hole| {
            PolygonSet::from_shape(&hole, clearance, self.settings.approx(bias))
        })
    }

    /// Polygons of every unique layer for `bias`.
    ///
    /// Custom outlines are fractured. The outside pass also measures the
    /// bounding radius.
    #[must_use]
    pub fn build_effective_polygons(&self, bias: ErrorLoc) -> LayerPolygons {
        let mut per_layer = BTreeMap::new();

        for layer in self.padstack.unique_layers() {
            let mut polygon = self.shape_to_polygon(layer, 0.0, bias);
            if self.padstack.shape_props(layer).shape == PadShape::Custom {
                polygon.fracture();
            }
            per_layer.insert(layer, Arc::new(polygon));
        }

        let bounding_radius = if bias == ErrorLoc::Outside {
            let from_outlines = per_layer
                .values()
                .flat_map(|p| p.outlines())
                .flatten()
                .map(|v| v.distance(self.position))
                .fold(0.0, f64::max);
            let drill = self.padstack.drill().size;
            from_outlines.max(drill.x.max(drill.y) / 2.0)
        } else {
            0.0
        };

        tracing::trace!(
            layers = per_layer.len(),
            ?bias,
            bounding_radius,
            "Built effective pad polygons"
        );

        LayerPolygons {
            per_layer,
            bounding_radius,
        }
    }
}

/// Pushes a rectangle, rounded rectangle or trapezoid.
///
/// Rounded rectangles are the rectangle shrunk by the corner radius plus an
/// edge capsule of width `2r` along each side. When both reduced
/// half-sizes collapse below [`MIN_SEGMENT_LENGTH`] the result is a circle
/// of the corner radius; when only one does, a capsule of width `2r`.
fn push_rect_shapes(
    out: &mut CompoundShape,
    pos: Point,
    size: Point,
    orientation: f64,
    radius: f64,
    half_delta: Point,
) {
    let mut half = size * 0.5;

    if radius > 0.0 {
        half = half - Point::new(radius, radius);
        let collapsed_x = half.x < MIN_SEGMENT_LENGTH;
        let collapsed_y = half.y < MIN_SEGMENT_LENGTH;

        if collapsed_x && collapsed_y {
            out.push(Shape::Circle {
                center: pos,
                radius,
            });
            return;
        }
        if collapsed_x || collapsed_y {
            let half_len = if collapsed_y {
                Point::new(half.x, 0.0)
            } else {
                Point::new(0.0, half.y)
            }
            .rotate(orientation);
            out.push(Shape::Segment {
                start: pos - half_len,
                end: pos + half_len,
                width: radius * 2.0,
            });
            return;
        }
    }

    let corners = trapezoid_corners(half * 2.0, half_delta).map(|c| c.rotate(orientation) + pos);
    out.push(rect_or_polygon(corners));

    if radius > 0.0 {
        for i in 0..4 {
            out.push(Shape::Segment {
                start: corners[i],
                end: corners[(i + 1) % 4],
                width: radius * 2.0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::padstack::DrillProps;
    use crate::geometry::mils_to_iu;

    fn builder(ps: &Padstack) -> ShapeBuilder<'_> {
        ShapeBuilder::new(ps, Point::ZERO, GeometrySettings::default())
    }

    #[test]
    fn circle_pad_is_one_circle() {
        let ps = Padstack::new();
        let shape = builder(&ps).layer_shape(PcbLayer::FCu);
        assert_eq!(shape.len(), 1);
        match &shape.shapes()[0] {
            Shape::Circle { radius, .. } => assert!((radius - mils_to_iu(30.0)).abs() < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn offset_is_rotated() {
        let mut ps = Padstack::new();
        ps.shape_props_mut(PcbLayer::FCu).offset = Point::new(1000.0, 0.0);
        ps.set_orientation(90.0);
        let b = ShapeBuilder::new(&ps, Point::new(10.0, 10.0), GeometrySettings::default());
        assert_eq!(b.shape_pos(PcbLayer::FCu), Point::new(10.0, 1010.0));
    }

    #[test]
    fn oval_is_capsule_along_long_axis() {
        let mut ps = Padstack::new();
        let props = ps.shape_props_mut(PcbLayer::FCu);
        props.shape = PadShape::Oval;
        props.size = Point::new(3.0e6, 1.0e6);
        match &builder(&ps).layer_shape(PcbLayer::FCu).shapes()[0] {
            Shape::Segment { start, end, width } => {
                assert!((start.x + 1.0e6).abs() < 1e-6);
                assert!((end.x - 1.0e6).abs() < 1e-6);
                assert!((width - 1.0e6).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rotated_rect_stays_rect_at_right_angles() {
        let mut ps = Padstack::new();
        let props = ps.shape_props_mut(PcbLayer::FCu);
        props.shape = PadShape::Rect;
        props.size = Point::new(2.0e6, 1.0e6);
        ps.set_orientation(90.0);
        let shape = builder(&ps).layer_shape(PcbLayer::FCu);
        assert_eq!(shape.shapes()[0].kind_name(), "rect");
        assert!((shape.bbox().height() - 2.0e6).abs() < 1e-6);

        ps.set_orientation(30.0);
        let shape = builder(&ps).layer_shape(PcbLayer::FCu);
        assert_eq!(shape.shapes()[0].kind_name(), "polygon");
    }

    #[test]
    fn round_rect_adds_edge_capsules() {
        let mut ps = Padstack::new();
        let props = ps.shape_props_mut(PcbLayer::FCu);
        props.shape = PadShape::RoundRect;
        props.size = Point::new(mils_to_iu(100.0), mils_to_iu(60.0));
        props.round_rect_ratio = 0.25;
        let shape = builder(&ps).layer_shape(PcbLayer::FCu);
        assert_eq!(shape.len(), 5);
        let b = shape.bbox();
        assert!((b.width() - mils_to_iu(100.0)).abs() < 1e-6);
        assert!((b.height() - mils_to_iu(60.0)).abs() < 1e-6);
    }

    #[test]
    fn square_round_rect_at_half_ratio_is_circle() {
        let mut ps = Padstack::new();
        let props = ps.shape_props_mut(PcbLayer::FCu);
        props.shape = PadShape::RoundRect;
        props.size = Point::new(mils_to_iu(60.0), mils_to_iu(60.0));
        props.round_rect_ratio = 0.5;
        let shape = builder(&ps).layer_shape(PcbLayer::FCu);
        assert_eq!(shape.len(), 1);
        assert!(matches!(
            shape.shapes()[0],
            Shape::Circle { radius, .. } if (radius - mils_to_iu(30.0)).abs() < 1e-6
        ));
    }

    #[test]
    fn corner_radius_never_exceeds_half_the_smaller_side() {
        let mut ps = Padstack::new();
        let props = ps.shape_props_mut(PcbLayer::FCu);
        props.shape = PadShape::RoundRect;
        props.size = Point::new(2.0e6, 1.0e6);
        props.round_rect_ratio = 0.7;
        assert!((props.round_rect_radius() - 0.5e6).abs() < 1e-6);

        let b = builder(&ps).layer_shape(PcbLayer::FCu).bbox();
        assert!((b.width() - 2.0e6).abs() < 1e-6);
        assert!((b.height() - 1.0e6).abs() < 1e-6);
    }

    #[test]
    fn one_collapsed_side_gives_capsule() {
        let mut ps = Padstack::new();
        let props = ps.shape_props_mut(PcbLayer::FCu);
        props.shape = PadShape::RoundRect;
        props.size = Point::new(mils_to_iu(100.0), mils_to_iu(60.0));
        props.round_rect_ratio = 0.5;
        let shape = builder(&ps).layer_shape(PcbLayer::FCu);
        assert_eq!(shape.len(), 1);
        match &shape.shapes()[0] {
            Shape::Segment { start, end, width } => {
                assert!((width - mils_to_iu(60.0)).abs() < 1e-6);
                assert!((start.distance(*end) - mils_to_iu(40.0)).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn oblong_hole_is_capsule() {
        let mut ps = Padstack::new();
        *ps.drill_mut() = DrillProps {
            shape: DrillShape::Oblong,
            size: Point::new(2.0e6, 1.0e6),
            start: None,
            end: None,
        };
        match builder(&ps).hole_shape() {
            Some(Shape::Segment { start, end, width }) => {
                assert!((start.distance(end) - 1.0e6).abs() < 1e-6);
                assert!((width - 1.0e6).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
        *ps.drill_mut() = DrillProps::NONE;
        assert!(builder(&ps).hole_shape().is_none());
    }

    #[test]
    fn effective_bbox_includes_hole_and_margin() {
        let mut ps = Padstack::new();
        ps.shape_props_mut(PcbLayer::FCu).size = Point::new(1.0e6, 1.0e6);
        *ps.drill_mut() = DrillProps::circle(2.0e6);
        let shapes = builder(&ps).build_effective_shapes();
        assert!((shapes.bbox.width() - 2.0e6 - 2.0).abs() < 1e-6);
    }

    #[test]
    fn custom_pad_merges_anchor_and_primitives() {
        use crate::board::primitive::Primitive;

        let mut ps = Padstack::new();
        let copper = ps.copper_layer_mut(PcbLayer::FCu);
        copper.shape.shape = PadShape::Custom;
        copper.shape.size = Point::new(1.0e6, 1.0e6);
        copper.primitives.push(Primitive::filled_rect(
            Point::new(0.0, -2.5e5),
            Point::new(2.0e6, 2.5e5),
        ));

        let b = builder(&ps);
        let merged = b.merge_primitives_as_polygon(PcbLayer::FCu, ErrorLoc::Inside);
        assert_eq!(merged.outline_count(), 1);
        assert!((merged.bbox().max_x - 2.0e6).abs() < 1e-6);

        let shape = b.layer_shape(PcbLayer::FCu);
        assert_eq!(shape.len(), 2);
    }

    #[test]
    fn outside_polygons_measure_bounding_radius() {
        let ps = Padstack::new();
        let b = builder(&ps);
        let outside = b.build_effective_polygons(ErrorLoc::Outside);
        let inside = b.build_effective_polygons(ErrorLoc::Inside);
        let r = mils_to_iu(30.0);
        assert!(outside.bounding_radius >= r);
        assert!(outside.bounding_radius <= r + DEFAULT_MAX_ERROR + 1.0);
        assert!(inside.bounding_radius.abs() < f64::EPSILON);
    }

    #[test]
    fn hole_polygon_grows_with_clearance() {
        let ps = Padstack::new();
        let b = builder(&ps);
        let plain = b.hole_to_polygon(0.0, ErrorLoc::Inside);
        let grown = b.hole_to_polygon(1.0e5, ErrorLoc::Inside);
        assert!(grown.area() > plain.area());
    }
}
