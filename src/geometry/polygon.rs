//! Polygon sets and shape-to-polygon conversion.
//!
//! Curved outlines are approximated by chords. The [`ErrorLoc`] bias decides
//! on which side of the true curve the approximation lies:
//!
//! - [`ErrorLoc::Inside`] places every vertex on the curve, so the polygon
//!   under-estimates the true shape (hit-testing, annular ring checks).
//! - [`ErrorLoc::Outside`] pushes the vertices out so every chord is tangent
//!   to the curve, so the polygon over-estimates it (keep-outs, bounding
//!   radius).
//!
//! For the same input, the outside polygon always contains the inside one.

use geo::{BooleanOps, ConvexHull, Coord, LineString, MultiPolygon, Polygon};

use super::shape::{point_in_ring, ring_area, ring_edges, Shape};
use super::{distance_to_segment, BoundingBox, Point};

/// Minimum number of segments used for a full circle by
/// [`arc_to_segment_count`].
pub const MIN_SEGCOUNT_FOR_CIRCLE: usize = 8;

/// Default minimum number of segments for pad circles.
pub const DEFAULT_MIN_SEGMENTS_PER_CIRCLE: usize = 16;

/// Polygons whose area falls below this (in IU²) count as empty.
pub const EMPTY_AREA_EPSILON: f64 = 1.0;

/// Which side of the true outline a polygon approximation lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorLoc {
    /// Vertices on the curve; polygon inside the true shape.
    Inside,
    /// Chords tangent to the curve; polygon outside the true shape.
    Outside,
}

impl ErrorLoc {
    /// The opposite bias.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Inside => Self::Outside,
            Self::Outside => Self::Inside,
        }
    }

    /// Index for per-bias storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Inside => 0,
            Self::Outside => 1,
        }
    }
}

/// Arc approximation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcApprox {
    /// Maximum distance between a chord and the true arc.
    pub max_error: f64,
    /// Minimum segment count for a full circle.
    pub min_segments: usize,
    /// Side of the true outline the approximation lies on.
    pub bias: ErrorLoc,
}

impl ArcApprox {
    /// Creates approximation parameters with the default minimum segment count.
    #[must_use]
    pub const fn new(max_error: f64, bias: ErrorLoc) -> Self {
        Self {
            max_error,
            min_segments: DEFAULT_MIN_SEGMENTS_PER_CIRCLE,
            bias,
        }
    }

    /// Returns a copy with a different minimum segment count.
    #[must_use]
    pub const fn with_min_segments(mut self, min_segments: usize) -> Self {
        self.min_segments = min_segments;
        self
    }

    /// Returns a copy with a different bias.
    #[must_use]
    pub const fn with_bias(mut self, bias: ErrorLoc) -> Self {
        self.bias = bias;
        self
    }

    /// Segment count for a full circle of `radius`, rounded up to a
    /// multiple of 8 so that approximations line up at 45°.
    #[must_use]
    pub fn circle_segments(&self, radius: f64) -> usize {
        let n = arc_to_segment_count(radius, self.max_error, 360.0).max(self.min_segments);
        n.div_ceil(8) * 8
    }
}

/// Number of chords needed to approximate an arc of `radius` sweeping
/// `arc_degrees` with at most `max_error` deviation.
///
/// A full circle never uses fewer than [`MIN_SEGCOUNT_FOR_CIRCLE`] segments
/// and any arc uses at least 2.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn arc_to_segment_count(radius: f64, max_error: f64, arc_degrees: f64) -> usize {
    let radius = radius.abs();
    if radius <= 0.0 || max_error <= 0.0 {
        return 2;
    }
    let rel_error = (max_error / radius).min(1.0);
    let arc_increment = (2.0 * (1.0 - rel_error).acos().to_degrees())
        .min(360.0 / MIN_SEGCOUNT_FOR_CIRCLE as f64);
    let count = (arc_degrees.abs() / arc_increment).round() as usize;
    count.max(2)
}

/// Appends an arc to `out`, from `start_deg` sweeping `sweep_deg`
/// (positive is counter-clockwise). Both end points lie on the true arc.
fn push_arc(out: &mut Vec<Point>, center: Point, radius: f64, start_deg: f64, sweep_deg: f64, approx: ArcApprox) {
    let at = |deg: f64, r: f64| {
        let (sin, cos) = deg.to_radians().sin_cos();
        Point::new(r.mul_add(cos, center.x), r.mul_add(sin, center.y))
    };

    if radius <= 0.0 || sweep_deg == 0.0 {
        out.push(center);
        return;
    }

    let count = arc_to_segment_count(radius, approx.max_error, sweep_deg);
    #[allow(clippy::cast_precision_loss)]
    let step = sweep_deg / count as f64;

    out.push(at(start_deg, radius));
    match approx.bias {
        ErrorLoc::Inside => {
            for i in 1..count {
                #[allow(clippy::cast_precision_loss)]
                out.push(at(step.mul_add(i as f64, start_deg), radius));
            }
        }
        ErrorLoc::Outside => {
            let outer = radius / (step / 2.0).to_radians().cos();
            for i in 0..count {
                #[allow(clippy::cast_precision_loss)]
                out.push(at(step.mul_add(i as f64 + 0.5, start_deg), outer));
            }
        }
    }
    out.push(at(start_deg + sweep_deg, radius));
}

/// Angle of a vector in degrees.
fn angle_of(v: Point) -> f64 {
    v.y.atan2(v.x).to_degrees()
}

/// Drops consecutive duplicate points, including a closing duplicate.
fn dedup_ring(points: &mut Vec<Point>) {
    points.dedup_by(|a, b| a.distance(*b) < 1e-9);
    while points.len() > 1 && points[0].distance(points[points.len() - 1]) < 1e-9 {
        points.pop();
    }
}

/// Outline vertices of a ring without the closing duplicate.
fn ring_points(ring: &LineString<f64>) -> Vec<Point> {
    let mut points: Vec<Point> = ring.coords().map(|c| Point::from(*c)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn to_line_string(points: &[Point]) -> LineString<f64> {
    LineString::from(points.iter().map(|p| Coord::from(*p)).collect::<Vec<_>>())
}

/// A set of polygons, each with an outer outline and optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSet {
    polygons: MultiPolygon<f64>,
}

impl Default for PolygonSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            polygons: MultiPolygon::new(Vec::new()),
        }
    }

    /// Creates a set holding one outline without holes.
    #[must_use]
    pub fn from_outline(points: &[Point]) -> Self {
        let mut points = points.to_vec();
        dedup_ring(&mut points);
        if points.len() < 3 {
            return Self::new();
        }
        Self {
            polygons: MultiPolygon::new(vec![Polygon::new(to_line_string(&points), Vec::new())]),
        }
    }

    /// Wraps an existing `geo` multipolygon.
    #[must_use]
    pub const fn from_multi_polygon(polygons: MultiPolygon<f64>) -> Self {
        Self { polygons }
    }

    /// The underlying `geo` multipolygon.
    #[must_use]
    pub const fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    /// Filled circle.
    #[must_use]
    pub fn circle(center: Point, radius: f64, approx: ArcApprox) -> Self {
        if radius <= 0.0 {
            return Self::new();
        }
        let count = approx.circle_segments(radius);
        #[allow(clippy::cast_precision_loss)]
        let step = 360.0 / count as f64;
        let r = match approx.bias {
            ErrorLoc::Inside => radius,
            ErrorLoc::Outside => radius / (step / 2.0).to_radians().cos(),
        };
        let points: Vec<Point> = (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let (sin, cos) = (step * (i as f64 + 0.5)).to_radians().sin_cos();
                Point::new(r.mul_add(cos, center.x), r.mul_add(sin, center.y))
            })
            .collect();
        Self::from_outline(&points)
    }

    /// Capsule: the segment `start`-`end` swept by a disc of diameter `width`.
    ///
    /// A zero-length segment degenerates to a circle.
    #[must_use]
    pub fn oval(start: Point, end: Point, width: f64, approx: ArcApprox) -> Self {
        let radius = width / 2.0;
        if radius <= 0.0 {
            return Self::new();
        }
        let axis = end - start;
        if axis.norm() < 1e-9 {
            return Self::circle(start, radius, approx);
        }

        let theta = angle_of(axis);
        let semi = ArcApprox {
            min_segments: approx.min_segments / 2,
            ..approx
        };
        let mut points = Vec::new();
        push_arc(&mut points, end, radius, theta - 90.0, 180.0, semi);
        push_arc(&mut points, start, radius, theta + 90.0, 180.0, semi);
        Self::from_outline(&points)
    }

    /// Rectangle of `size` centred on `center` and rotated by `rotation`
    /// degrees, with rounded corners of `corner_radius` and the corners
    /// flagged in `chamfered` cut by `chamfer_ratio × min(size)`.
    ///
    /// Corners are ordered top-left, top-right, bottom-right, bottom-left in
    /// the pad's local frame. `clearance` grows (or shrinks) the result with
    /// round corners.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn round_chamfered_rect(
        center: Point,
        size: Point,
        rotation: f64,
        corner_radius: f64,
        chamfer_ratio: f64,
        chamfered: [bool; 4],
        clearance: f64,
        approx: ArcApprox,
    ) -> Self {
        let has_chamfer = chamfer_ratio > 0.0 && chamfered.iter().any(|c| *c);

        if clearance < 0.0 {
            let base = Self::round_chamfered_rect(
                center,
                size,
                rotation,
                corner_radius,
                chamfer_ratio,
                chamfered,
                0.0,
                approx,
            );
            return base.inflated(clearance, approx);
        }

        if clearance > 0.0 && !has_chamfer {
            // Growing a rounded rectangle keeps it a rounded rectangle.
            return Self::round_chamfered_rect(
                center,
                Point::new(2.0f64.mul_add(clearance, size.x), 2.0f64.mul_add(clearance, size.y)),
                rotation,
                corner_radius.max(0.0) + clearance,
                0.0,
                chamfered,
                0.0,
                approx,
            );
        }

        let hx = size.x / 2.0;
        let hy = size.y / 2.0;
        if hx <= 0.0 || hy <= 0.0 {
            return Self::new();
        }
        let radius = corner_radius.clamp(0.0, hx.min(hy));
        let chamfer = if has_chamfer {
            chamfer_ratio * size.x.min(size.y)
        } else {
            0.0
        };

        let corners = [
            Point::new(-hx, -hy),
            Point::new(hx, -hy),
            Point::new(hx, hy),
            Point::new(-hx, hy),
        ];

        let mut points = Vec::new();
        for i in 0..4 {
            let corner = corners[i];
            let prev = corners[(i + 3) % 4];
            let next = corners[(i + 1) % 4];
            let u_in = (corner - prev).normalized();
            let u_out = (next - corner).normalized();

            if chamfered[i] && chamfer > 0.0 {
                points.push(corner - u_in * chamfer);
                points.push(corner + u_out * chamfer);
            } else if radius > 0.0 {
                let arc_center = corner - u_in * radius + u_out * radius;
                let start = corner - u_in * radius;
                push_arc(&mut points, arc_center, radius, angle_of(start - arc_center), 90.0, approx);
            } else {
                points.push(corner);
            }
        }

        let mut outline = Self::from_outline(&points);
        if clearance > 0.0 {
            outline = Self::convex_inflated(&points, clearance, approx);
        }
        outline.rotated(Point::ZERO, rotation).translated(center)
    }

    /// Trapezoid of `size` with the half deltas `half_delta` applied to its
    /// corners, centred on `center`, rotated by `rotation` degrees and grown
    /// by `clearance` with round corners.
    #[must_use]
    pub fn trapezoid(
        center: Point,
        size: Point,
        rotation: f64,
        half_delta: Point,
        clearance: f64,
        approx: ArcApprox,
    ) -> Self {
        let corners = trapezoid_corners(size, half_delta);
        let outline = if clearance > 0.0 {
            Self::convex_inflated(&corners, clearance, approx)
        } else if clearance < 0.0 {
            Self::from_outline(&corners).inflated(clearance, approx)
        } else {
            Self::from_outline(&corners)
        };
        outline.rotated(Point::ZERO, rotation).translated(center)
    }

    /// Converts an analytic shape, grown by `clearance`.
    #[must_use]
    pub fn from_shape(shape: &Shape, clearance: f64, approx: ArcApprox) -> Self {
        match shape {
            Shape::Circle { center, radius } => Self::circle(*center, radius + clearance, approx),
            Shape::Segment { start, end, width } => {
                Self::oval(*start, *end, 2.0f64.mul_add(clearance, *width), approx)
            }
            Shape::Rect {
                origin,
                width,
                height,
            } => Self::round_chamfered_rect(
                Point::new(origin.x + width / 2.0, origin.y + height / 2.0),
                Point::new(*width, *height),
                0.0,
                0.0,
                0.0,
                [false; 4],
                clearance,
                approx,
            ),
            Shape::Polygon { points } => {
                let outline = Self::from_outline(points);
                if clearance == 0.0 {
                    outline
                } else {
                    outline.inflated(clearance, approx)
                }
            }
        }
    }

    /// Minkowski sum of a convex outline with a disc of radius `amount`.
    fn convex_inflated(points: &[Point], amount: f64, approx: ArcApprox) -> Self {
        let mut ring = points.to_vec();
        dedup_ring(&mut ring);
        if ring.len() < 3 {
            return Self::new();
        }
        if ring_area(&ring) < 0.0 {
            ring.reverse();
        }

        let n = ring.len();
        let mut out = Vec::with_capacity(n * 4);
        for i in 0..n {
            let v = ring[i];
            let d_in = v - ring[(i + n - 1) % n];
            let d_out = ring[(i + 1) % n] - v;
            // Outward normals of a counter-clockwise ring point right.
            let n_in = Point::new(d_in.y, -d_in.x).normalized();
            let n_out = Point::new(d_out.y, -d_out.x).normalized();
            let start = angle_of(n_in);
            let sweep = (angle_of(n_out) - start).rem_euclid(360.0);
            if sweep < 1e-9 || sweep > 180.0 {
                out.push(v + n_in * amount);
            } else {
                push_arc(&mut out, v, amount, start, sweep, approx);
            }
        }
        Self::from_outline(&out)
    }

    /// Grows the set by `amount` with round corners, or shrinks it when
    /// `amount` is negative.
    ///
    /// Works for arbitrary outlines: growing unions a capsule along every
    /// edge, shrinking subtracts them.
    #[must_use]
    pub fn inflated(&self, amount: f64, approx: ArcApprox) -> Self {
        if amount == 0.0 || self.polygons.0.is_empty() {
            return self.clone();
        }

        // Shrinking subtracts the capsules, so the bias flips to keep the
        // result on the requested side of the true outline.
        let capsule_approx = if amount > 0.0 {
            approx
        } else {
            approx.with_bias(approx.bias.flipped())
        };
        let width = amount.abs() * 2.0;

        let mut capsules = Self::new();
        for ring in self.rings() {
            for (a, b) in ring_edges(&ring) {
                capsules = capsules.union(&Self::oval(a, b, width, capsule_approx));
            }
        }

        if amount > 0.0 {
            self.union(&capsules)
        } else {
            self.difference(&capsules)
        }
    }

    /// Boolean union.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.polygons.0.is_empty() {
            return other.clone();
        }
        if other.polygons.0.is_empty() {
            return self.clone();
        }
        Self {
            polygons: self.polygons.union(&other.polygons),
        }
    }

    /// Boolean difference (`self` minus `other`).
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        if self.polygons.0.is_empty() || other.polygons.0.is_empty() {
            return self.clone();
        }
        Self {
            polygons: self.polygons.difference(&other.polygons),
        }
    }

    /// Boolean intersection.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if self.polygons.0.is_empty() || other.polygons.0.is_empty() {
            return Self::new();
        }
        Self {
            polygons: self.polygons.intersection(&other.polygons),
        }
    }

    /// Moves every vertex by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Point) -> Self {
        self.map_points(|p| p + delta)
    }

    /// Rotates every vertex about `center`.
    #[must_use]
    pub fn rotated(&self, center: Point, degrees: f64) -> Self {
        if degrees.rem_euclid(360.0) == 0.0 {
            return self.clone();
        }
        self.map_points(|p| p.rotate_about(center, degrees))
    }

    fn map_points(&self, f: impl Fn(Point) -> Point) -> Self {
        let map_ring = |ring: &LineString<f64>| {
            LineString::from(
                ring.coords()
                    .map(|c| Coord::from(f(Point::from(*c))))
                    .collect::<Vec<_>>(),
            )
        };
        let polygons = self
            .polygons
            .0
            .iter()
            .map(|poly| {
                Polygon::new(
                    map_ring(poly.exterior()),
                    poly.interiors().iter().map(map_ring).collect(),
                )
            })
            .collect();
        Self {
            polygons: MultiPolygon::new(polygons),
        }
    }

    /// Returns true when the set has no polygon of measurable area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty() || self.area() < EMPTY_AREA_EPSILON
    }

    /// Number of outer outlines.
    #[must_use]
    pub fn outline_count(&self) -> usize {
        self.polygons.0.len()
    }

    /// Number of holes across all polygons.
    #[must_use]
    pub fn hole_count(&self) -> usize {
        self.polygons.0.iter().map(|p| p.interiors().len()).sum()
    }

    /// Outer outlines, without closing duplicates.
    #[must_use]
    pub fn outlines(&self) -> Vec<Vec<Point>> {
        self.polygons
            .0
            .iter()
            .map(|p| ring_points(p.exterior()))
            .collect()
    }

    /// Every ring (outlines and holes), without closing duplicates.
    #[must_use]
    pub fn rings(&self) -> Vec<Vec<Point>> {
        self.polygons
            .0
            .iter()
            .flat_map(|p| {
                std::iter::once(p.exterior())
                    .chain(p.interiors().iter())
                    .map(ring_points)
            })
            .collect()
    }

    /// Every vertex of every ring.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point> {
        self.rings().into_iter().flatten().collect()
    }

    /// Total number of vertices.
    #[must_use]
    pub fn total_vertices(&self) -> usize {
        self.rings().iter().map(Vec::len).sum()
    }

    /// Enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygons
            .0
            .iter()
            .map(|p| {
                let outer = ring_area(&ring_points(p.exterior())).abs();
                let holes: f64 = p
                    .interiors()
                    .iter()
                    .map(|h| ring_area(&ring_points(h)).abs())
                    .sum();
                outer - holes
            })
            .sum()
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices())
    }

    /// Returns true when `p` is inside the set or within `accuracy` of an edge.
    #[must_use]
    pub fn contains(&self, p: Point, accuracy: f64) -> bool {
        for poly in &self.polygons.0 {
            let outer = ring_points(poly.exterior());
            if point_in_ring(p, &outer)
                && !poly
                    .interiors()
                    .iter()
                    .any(|h| point_in_ring(p, &ring_points(h)))
            {
                return true;
            }
        }

        accuracy > 0.0
            && self.rings().iter().any(|ring| {
                ring_edges(ring).any(|(a, b)| distance_to_segment(p, a, b) <= accuracy)
            })
    }

    /// Convex hull of all polygons.
    #[must_use]
    pub fn convex_hull(&self) -> Self {
        if self.polygons.0.is_empty() {
            return Self::new();
        }
        Self {
            polygons: MultiPolygon::new(vec![self.polygons.convex_hull()]),
        }
    }

    /// Removes holes by connecting each one to its outer outline through a
    /// zero-width bridge, leaving one outline per polygon.
    ///
    /// Holes are bridged in order of decreasing maximum X. The bridge runs
    /// from the hole's rightmost vertex along +X to the nearest outline edge,
    /// which no unbridged hole can cross.
    pub fn fracture(&mut self) {
        let polygons = self
            .polygons
            .0
            .iter()
            .map(|poly| {
                let mut outer = ring_points(poly.exterior());
                if ring_area(&outer) < 0.0 {
                    outer.reverse();
                }

                let mut holes: Vec<Vec<Point>> = poly
                    .interiors()
                    .iter()
                    .map(|h| {
                        let mut hole = ring_points(h);
                        if ring_area(&hole) > 0.0 {
                            hole.reverse();
                        }
                        hole
                    })
                    .filter(|h| h.len() >= 3)
                    .collect();
                holes.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));

                let mut leftover = Vec::new();
                for hole in holes {
                    match bridge_hole(&outer, &hole) {
                        Some(merged) => outer = merged,
                        None => leftover.push(to_line_string(&hole)),
                    }
                }
                if !leftover.is_empty() {
                    tracing::debug!(holes = leftover.len(), "Fracture left unbridged holes");
                }

                Polygon::new(to_line_string(&outer), leftover)
            })
            .collect();
        self.polygons = MultiPolygon::new(polygons);
    }
}

fn max_x(ring: &[Point]) -> f64 {
    ring.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
}

/// Splices `hole` into `outer` through a horizontal bridge.
fn bridge_hole(outer: &[Point], hole: &[Point]) -> Option<Vec<Point>> {
    let (m_index, m) = hole
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.x.total_cmp(&b.x))?;

    let mut best: Option<(usize, f64)> = None;
    for (i, (a, b)) in ring_edges(outer).enumerate() {
        let straddles = (a.y <= m.y && b.y > m.y) || (b.y <= m.y && a.y > m.y);
        if !straddles {
            continue;
        }
        let x = (b.x - a.x).mul_add((m.y - a.y) / (b.y - a.y), a.x);
        if x >= m.x && best.map_or(true, |(_, bx)| x < bx) {
            best = Some((i, x));
        }
    }
    let (edge, x) = best?;
    let bridge = Point::new(x, m.y);

    let n = hole.len();
    let mut merged = Vec::with_capacity(outer.len() + n + 3);
    merged.extend_from_slice(&outer[..=edge]);
    merged.push(bridge);
    merged.extend((0..=n).map(|k| hole[(m_index + k) % n]));
    merged.push(bridge);
    merged.extend_from_slice(&outer[edge + 1..]);
    Some(merged)
}

/// Corners of a trapezoid of `size` with half deltas applied, before
/// rotation. The X delta changes the height of the left and right sides, the
/// Y delta the width of the top and bottom sides.
#[must_use]
pub fn trapezoid_corners(size: Point, half_delta: Point) -> [Point; 4] {
    let hx = size.x / 2.0;
    let hy = size.y / 2.0;
    [
        Point::new(-hx - half_delta.y, hy + half_delta.x),
        Point::new(hx + half_delta.y, hy - half_delta.x),
        Point::new(hx - half_delta.y, -hy + half_delta.x),
        Point::new(-hx + half_delta.y, -hy - half_delta.x),
    ]
}
