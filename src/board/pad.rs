//! The pad entity.
//!
//! A [`Pad`] owns its [`Padstack`] and the geometry derived from it. Every
//! setter that changes outline geometry marks the shape cache and both
//! polygon caches dirty; setting a value equal to the current one does not.
//! Reads rebuild lazily through [`LazyCache`], so a pad can be shared
//! between threads behind an `Arc` once editing is done.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cache::{LazyCache, ZoneLayerOverride, ZoneLayerOverrides};
use super::layer::{BoardContext, LayerSet, PcbLayer};
use super::padstack::{
    ChamferPositions, CustomShapeZoneMode, DrillShape, PadShape, Padstack, PadstackMode,
    ShapeProps, UnconnectedLayerMode, ZoneConnection, MAX_CORNER_RATIO,
};
use super::primitive::Primitive;
use super::shape_builder::{EffectiveShapes, GeometrySettings, LayerPolygons, ShapeBuilder};
use crate::geometry::{BoundingBox, CompoundShape, ErrorLoc, Point, PolygonSet, Shape};

/// Net code of a pad with no net.
pub const UNCONNECTED_NET: i32 = 0;

/// Electrical/mechanical kind of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PadAttribute {
    /// Plated through-hole.
    #[default]
    #[serde(rename = "thru_hole")]
    Pth,
    /// Surface mount.
    #[serde(rename = "smd")]
    Smd,
    /// Edge connector finger: surface mount without paste.
    #[serde(rename = "connect")]
    Conn,
    /// Non-plated mechanical hole.
    #[serde(rename = "np_thru_hole")]
    Npth,
}

impl PadAttribute {
    /// Returns the stable textual token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pth => "thru_hole",
            Self::Smd => "smd",
            Self::Conn => "connect",
            Self::Npth => "np_thru_hole",
        }
    }
}

/// Fabrication property of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadProperty {
    /// No special property.
    #[default]
    None,
    /// BGA ball pad.
    Bga,
    /// Board-level fiducial.
    FiducialGlobal,
    /// Footprint-level fiducial.
    FiducialLocal,
    /// Test point.
    Testpoint,
    /// Thermal heatsink pad.
    Heatsink,
    /// Castellated edge pad.
    Castellated,
    /// Mechanical (non-electrical) pad.
    Mechanical,
    /// Press-fit pin.
    Pressfit,
}

impl PadProperty {
    /// Returns the stable textual token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bga => "bga",
            Self::FiducialGlobal => "fiducial_global",
            Self::FiducialLocal => "fiducial_local",
            Self::Testpoint => "testpoint",
            Self::Heatsink => "heatsink",
            Self::Castellated => "castellated",
            Self::Mechanical => "mechanical",
            Self::Pressfit => "pressfit",
        }
    }
}

/// Pad-level margin overrides, consulted after the padstack's per-layer
/// values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalOverrides {
    /// Copper clearance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance: Option<f64>,
    /// Solder mask expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_mask_margin: Option<f64>,
    /// Solder paste absolute margin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_paste_margin: Option<f64>,
    /// Solder paste margin as a fraction of the pad size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_paste_margin_ratio: Option<f64>,
    /// Zone connection style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_connection: Option<ZoneConnection>,
    /// Thermal spoke width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_spoke_width: Option<f64>,
    /// Thermal relief gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_gap: Option<f64>,
}

/// A pad: position, electrical identity and an owned padstack.
#[derive(Debug, Clone)]
pub struct Pad {
    uuid: Uuid,
    number: String,
    net_code: i32,
    position: Point,
    attribute: PadAttribute,
    property: PadProperty,
    padstack: Padstack,
    local: LocalOverrides,
    geometry: GeometrySettings,
    shapes: LazyCache<EffectiveShapes>,
    polygons: [LazyCache<LayerPolygons>; 2],
    zone_overrides: ZoneLayerOverrides,
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

impl Pad {
    /// A through-hole pad at the origin with the default padstack.
    #[must_use]
    pub fn new() -> Self {
        Self::with_padstack(PadAttribute::Pth, Padstack::new())
    }

    /// A pad of `attribute` around an existing padstack, taken as is.
    #[must_use]
    pub fn with_padstack(attribute: PadAttribute, padstack: Padstack) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            number: String::new(),
            net_code: UNCONNECTED_NET,
            position: Point::ZERO,
            attribute,
            property: PadProperty::None,
            padstack,
            local: LocalOverrides::default(),
            geometry: GeometrySettings::default(),
            shapes: LazyCache::new(),
            polygons: [LazyCache::new(), LazyCache::new()],
            zone_overrides: ZoneLayerOverrides::new(),
        }
    }

    /// A surface-mount pad on `F.Cu` of `size`.
    #[must_use]
    pub fn smd(shape: PadShape, size: Point) -> Self {
        let mut pad = Self::new();
        pad.set_attribute(PadAttribute::Smd);
        pad.set_layer_set(LayerSet::smd_mask());
        pad.set_shape(PcbLayer::FCu, shape);
        pad.set_size(PcbLayer::FCu, size);
        pad
    }

    // ------------------------------------------------------------------
    // Identity and electrical properties
    // ------------------------------------------------------------------

    /// Stable identity.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Replaces the identity, used when loading records.
    pub fn set_uuid(&mut self, uuid: Uuid) {
        self.uuid = uuid;
    }

    /// Pad number (may be empty).
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Sets the pad number.
    pub fn set_number(&mut self, number: impl Into<String>) {
        self.number = number.into();
    }

    /// Net code, [`UNCONNECTED_NET`] without a net.
    #[must_use]
    pub const fn net_code(&self) -> i32 {
        self.net_code
    }

    /// Sets the net code.
    pub fn set_net_code(&mut self, net_code: i32) {
        self.net_code = net_code;
    }

    /// Pad attribute.
    #[must_use]
    pub const fn attribute(&self) -> PadAttribute {
        self.attribute
    }

    /// Changes the attribute and adjusts the layers to match.
    ///
    /// Through-hole pads gain every copper layer. Surface-mount and
    /// connector pads keep at most one copper layer (`B.Cu` when present)
    /// and lose their drill. Mechanical holes lose their number and net.
    pub fn set_attribute(&mut self, attribute: PadAttribute) {
        if attribute != self.attribute {
            self.attribute = attribute;
            let mut layers = self.padstack.layer_set();

            match attribute {
                PadAttribute::Pth => layers = layers.union(LayerSet::all_copper()),
                PadAttribute::Smd | PadAttribute::Conn => {
                    let copper = layers.copper();
                    if copper.len() > 1 {
                        layers = layers.difference(LayerSet::all_copper());
                        let keep = if copper.contains(PcbLayer::BCu) {
                            Some(PcbLayer::BCu)
                        } else {
                            copper.first()
                        };
                        if let Some(layer) = keep {
                            layers.insert(layer);
                        }
                    }
                    self.padstack.drill_mut().size = Point::ZERO;
                }
                PadAttribute::Npth => {
                    self.number.clear();
                    self.net_code = UNCONNECTED_NET;
                }
            }

            self.padstack.set_layer_set(layers);
            tracing::debug!(attribute = attribute.as_str(), layers = ?layers, "Pad attribute changed");
            self.invalidate_geometry();
        }
    }

    /// Fabrication property.
    #[must_use]
    pub const fn property(&self) -> PadProperty {
        self.property
    }

    /// Sets the fabrication property.
    pub fn set_property(&mut self, property: PadProperty) {
        self.property = property;
    }

    /// Pad-level margin overrides.
    #[must_use]
    pub const fn local_overrides(&self) -> &LocalOverrides {
        &self.local
    }

    /// Mutable pad-level margin overrides. Margins never affect cached
    /// geometry.
    pub fn local_overrides_mut(&mut self) -> &mut LocalOverrides {
        &mut self.local
    }

    /// Returns true when the pad can carry a number: mechanical holes and
    /// aperture pads cannot.
    #[must_use]
    pub fn can_have_number(&self) -> bool {
        self.attribute != PadAttribute::Npth && !self.is_aperture_pad()
    }

    /// A surface-mount or connector pad with no copper, used as a paste or
    /// mask aperture.
    #[must_use]
    pub const fn is_aperture_pad(&self) -> bool {
        matches!(self.attribute, PadAttribute::Smd | PadAttribute::Conn)
            && !self.padstack.layer_set().has_copper()
    }

    // ------------------------------------------------------------------
    // Padstack access
    // ------------------------------------------------------------------

    /// The owned padstack.
    #[must_use]
    pub const fn padstack(&self) -> &Padstack {
        &self.padstack
    }

    /// Raw padstack access. Always invalidates the geometry caches and
    /// performs no clamping.
    pub fn edit_padstack<R>(&mut self, edit: impl FnOnce(&mut Padstack) -> R) -> R {
        let result = edit(&mut self.padstack);
        self.invalidate_geometry();
        result
    }

    /// Curve approximation settings.
    #[must_use]
    pub const fn geometry_settings(&self) -> GeometrySettings {
        self.geometry
    }

    /// Changes the curve approximation settings.
    pub fn set_geometry_settings(&mut self, settings: GeometrySettings) {
        if settings != self.geometry {
            self.geometry = settings;
            self.invalidate_geometry();
        }
    }

    /// Uses the board's copper layer count.
    pub fn attach_board(&mut self, board: &dyn BoardContext) {
        let count = board.copper_layer_count();
        if count != self.padstack.copper_layer_count() {
            self.padstack.set_copper_layer_count(count);
            self.invalidate_geometry();
        }
    }

    /// Padstack mode.
    #[must_use]
    pub const fn padstack_mode(&self) -> PadstackMode {
        self.padstack.mode()
    }

    /// Switches the padstack mode.
    pub fn set_padstack_mode(&mut self, mode: PadstackMode) {
        if mode != self.padstack.mode() {
            self.padstack.set_mode(mode);
            self.invalidate_geometry();
        }
    }

    /// Outline kind on `layer`.
    #[must_use]
    pub fn shape(&self, layer: PcbLayer) -> PadShape {
        self.padstack.shape_props(layer).shape
    }

    /// Sets the outline kind on `layer`.
    pub fn set_shape(&mut self, layer: PcbLayer, shape: PadShape) {
        self.update_shape_props(layer, shape, |p| &mut p.shape);
    }

    /// Anchor kind of a custom pad on `layer`.
    #[must_use]
    pub fn anchor_shape(&self, layer: PcbLayer) -> PadShape {
        self.padstack.shape_props(layer).anchor_shape
    }

    /// Sets the anchor kind; only circles and rectangles are meaningful,
    /// anything else becomes a circle.
    pub fn set_anchor_shape(&mut self, layer: PcbLayer, shape: PadShape) {
        let shape = if shape == PadShape::Rect {
            PadShape::Rect
        } else {
            PadShape::Circle
        };
        self.update_shape_props(layer, shape, |p| &mut p.anchor_shape);
    }

    /// Size on `layer`.
    #[must_use]
    pub fn size(&self, layer: PcbLayer) -> Point {
        self.padstack.shape_props(layer).size
    }

    /// Sets the size on `layer`.
    pub fn set_size(&mut self, layer: PcbLayer, size: Point) {
        self.update_shape_props(layer, size, |p| &mut p.size);
    }

    /// Shape offset on `layer`, before rotation.
    #[must_use]
    pub fn offset(&self, layer: PcbLayer) -> Point {
        self.padstack.shape_props(layer).offset
    }

    /// Sets the shape offset on `layer`.
    pub fn set_offset(&mut self, layer: PcbLayer, offset: Point) {
        self.update_shape_props(layer, offset, |p| &mut p.offset);
    }

    /// Trapezoid delta on `layer`.
    #[must_use]
    pub fn trapezoid_delta(&self, layer: PcbLayer) -> Point {
        self.padstack.shape_props(layer).trapezoid_delta
    }

    /// Sets the trapezoid delta on `layer`.
    pub fn set_trapezoid_delta(&mut self, layer: PcbLayer, delta: Point) {
        self.update_shape_props(layer, delta, |p| &mut p.trapezoid_delta);
    }

    /// Corner radius ratio on `layer`.
    #[must_use]
    pub fn round_rect_ratio(&self, layer: PcbLayer) -> f64 {
        self.padstack.shape_props(layer).round_rect_ratio
    }

    /// Sets the corner radius ratio, clamped to [0, 0.5].
    pub fn set_round_rect_ratio(&mut self, layer: PcbLayer, ratio: f64) {
        let ratio = ratio.clamp(0.0, MAX_CORNER_RATIO);
        self.update_shape_props(layer, ratio, |p| &mut p.round_rect_ratio);
    }

    /// Corner radius on `layer`: ratio times the smaller side.
    #[must_use]
    pub fn round_rect_corner_radius(&self, layer: PcbLayer) -> f64 {
        self.padstack.shape_props(layer).round_rect_radius()
    }

    /// Sets the corner radius through the ratio. Ignored while the pad has
    /// no positive size on `layer`.
    pub fn set_round_rect_corner_radius(&mut self, layer: PcbLayer, radius: f64) {
        let size = self.size(layer);
        let min_side = size.x.min(size.y);
        if min_side > 0.0 {
            self.set_round_rect_ratio(layer, radius / min_side);
        }
    }

    /// Chamfer ratio on `layer`.
    #[must_use]
    pub fn chamfer_ratio(&self, layer: PcbLayer) -> f64 {
        self.padstack.shape_props(layer).chamfer_ratio
    }

    /// Sets the chamfer ratio, clamped to [0, 0.5].
    pub fn set_chamfer_ratio(&mut self, layer: PcbLayer, ratio: f64) {
        let ratio = ratio.clamp(0.0, MAX_CORNER_RATIO);
        self.update_shape_props(layer, ratio, |p| &mut p.chamfer_ratio);
    }

    /// Chamfered corners on `layer`.
    #[must_use]
    pub fn chamfer_positions(&self, layer: PcbLayer) -> ChamferPositions {
        self.padstack.shape_props(layer).chamfer_positions
    }

    /// Sets the chamfered corners on `layer`.
    pub fn set_chamfer_positions(&mut self, layer: PcbLayer, positions: ChamferPositions) {
        self.update_shape_props(layer, positions, |p| &mut p.chamfer_positions);
    }

    /// Custom shape primitives on `layer`.
    #[must_use]
    pub fn primitives(&self, layer: PcbLayer) -> &[Primitive] {
        &self.padstack.copper_layer(layer).primitives
    }

    /// Replaces the custom shape primitives on `layer`.
    pub fn set_primitives(&mut self, layer: PcbLayer, primitives: Vec<Primitive>) {
        let slot = &mut self.padstack.copper_layer_mut(layer).primitives;
        if *slot != primitives {
            *slot = primitives;
            self.invalidate_geometry();
        }
    }

    /// Appends a custom shape primitive on `layer`.
    pub fn add_primitive(&mut self, layer: PcbLayer, primitive: Primitive) {
        self.padstack
            .copper_layer_mut(layer)
            .primitives
            .push(primitive);
        self.invalidate_geometry();
    }

    /// Layers the pad is on.
    #[must_use]
    pub const fn layer_set(&self) -> LayerSet {
        self.padstack.layer_set()
    }

    /// Sets the layers the pad is on.
    pub fn set_layer_set(&mut self, layers: LayerSet) {
        if layers != self.padstack.layer_set() {
            self.padstack.set_layer_set(layers);
            self.invalidate_geometry();
        }
    }

    /// Returns true when the pad is on `layer`.
    #[must_use]
    pub const fn is_on_layer(&self, layer: PcbLayer) -> bool {
        self.padstack.layer_set().contains(layer)
    }

    /// Returns true when the pad has any copper layer.
    #[must_use]
    pub const fn is_on_copper_layer(&self) -> bool {
        self.padstack.layer_set().has_copper()
    }

    /// The layer the pad is primarily drawn on: its copper layer for
    /// surface-mount pads, otherwise the first layer of its set.
    #[must_use]
    pub fn principal_layer(&self) -> PcbLayer {
        let layers = self.padstack.layer_set();
        let copper = match self.attribute {
            PadAttribute::Smd | PadAttribute::Conn => layers.copper().first(),
            PadAttribute::Pth | PadAttribute::Npth => None,
        };
        copper.or_else(|| layers.first()).unwrap_or(PcbLayer::FCu)
    }

    /// Drill size.
    #[must_use]
    pub const fn drill_size(&self) -> Point {
        self.padstack.drill().size
    }

    /// Sets the drill size.
    pub fn set_drill_size(&mut self, size: Point) {
        if size != self.padstack.drill().size {
            self.padstack.drill_mut().size = size;
            self.invalidate_geometry();
        }
    }

    /// Drill shape.
    #[must_use]
    pub const fn drill_shape(&self) -> DrillShape {
        self.padstack.drill().shape
    }

    /// Sets the drill shape.
    pub fn set_drill_shape(&mut self, shape: DrillShape) {
        if shape != self.padstack.drill().shape {
            self.padstack.drill_mut().shape = shape;
            self.invalidate_geometry();
        }
    }

    /// Returns true when the pad has a drilled hole.
    #[must_use]
    pub fn has_hole(&self) -> bool {
        self.padstack.drill().is_drilled()
    }

    /// Unconnected layer policy.
    #[must_use]
    pub const fn unconnected_layer_mode(&self) -> UnconnectedLayerMode {
        self.padstack.unconnected_layer_mode()
    }

    /// Sets the unconnected layer policy. Only flashing depends on it.
    pub fn set_unconnected_layer_mode(&mut self, mode: UnconnectedLayerMode) {
        self.padstack.set_unconnected_layer_mode(mode);
    }

    /// Custom shape zone outline policy.
    #[must_use]
    pub const fn custom_shape_zone_mode(&self) -> CustomShapeZoneMode {
        self.padstack.custom_shape_zone_mode()
    }

    /// Sets the custom shape zone outline policy.
    pub fn set_custom_shape_zone_mode(&mut self, mode: CustomShapeZoneMode) {
        self.padstack.set_custom_shape_zone_mode(mode);
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Pad position.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Moves the pad to `position`.
    pub fn set_position(&mut self, position: Point) {
        if position != self.position {
            self.position = position;
            self.invalidate_geometry();
        }
    }

    /// Moves the pad by `delta`.
    pub fn move_by(&mut self, delta: Point) {
        self.set_position(self.position + delta);
    }

    /// Orientation in degrees.
    #[must_use]
    pub const fn orientation(&self) -> f64 {
        self.padstack.orientation()
    }

    /// Sets the orientation in degrees.
    pub fn set_orientation(&mut self, degrees: f64) {
        let before = self.padstack.orientation();
        self.padstack.set_orientation(degrees);
        #[allow(clippy::float_cmp)]
        let changed = self.padstack.orientation() != before;
        if changed {
            self.invalidate_geometry();
        }
    }

    /// Rotates the pad about `center`.
    pub fn rotate(&mut self, center: Point, degrees: f64) {
        #[allow(clippy::float_cmp)]
        let full_turn = degrees.rem_euclid(360.0) == 0.0;
        if full_turn {
            return;
        }
        self.position = self.position.rotate_about(center, degrees);
        self.padstack
            .set_orientation(self.padstack.orientation() + degrees);
        self.invalidate_geometry();
    }

    /// Mirrors the pad about the vertical line `x = center_x` and moves it
    /// to the other board side.
    pub fn flip(&mut self, center_x: f64) {
        let count = self.padstack.copper_layer_count();

        self.position = self.position.mirror_x(center_x);
        self.padstack.for_each_copper_layer_mut(|copper| {
            copper.shape.offset.x = -copper.shape.offset.x;
            copper.shape.trapezoid_delta.x = -copper.shape.trapezoid_delta.x;
            copper.shape.chamfer_positions = copper.shape.chamfer_positions.mirrored_left_right();
            for primitive in &mut copper.primitives {
                primitive.mirror_x(0.0);
            }
        });
        self.padstack.set_orientation(-self.padstack.orientation());
        self.padstack
            .set_layer_set(self.padstack.layer_set().flipped(count));
        self.padstack.flip_layers(count);

        self.invalidate_geometry();
    }

    // ------------------------------------------------------------------
    // Derived geometry
    // ------------------------------------------------------------------

    fn builder(&self) -> ShapeBuilder<'_> {
        ShapeBuilder::new(&self.padstack, self.position, self.geometry)
    }

    /// Centre of the outline on `layer`.
    #[must_use]
    pub fn shape_pos(&self, layer: PcbLayer) -> Point {
        self.builder().shape_pos(layer)
    }

    /// All effective shapes, built on first use.
    #[must_use]
    pub fn effective_shapes(&self) -> Arc<EffectiveShapes> {
        self.shapes
            .get_or_build(|| self.builder().build_effective_shapes())
    }

    /// Effective shape of `layer`. Technical layers resolve to the outer
    /// copper record of their side.
    #[must_use]
    pub fn effective_shape(&self, layer: PcbLayer) -> Arc<CompoundShape> {
        let shapes = self.effective_shapes();
        let key = self.padstack.effective_layer_for(layer);
        if let Some(shape) = shapes.per_layer.get(&key) {
            return Arc::clone(shape);
        }

        tracing::error!(layer = %layer, key = %key, "No effective shape built for layer");
        shapes
            .per_layer
            .values()
            .next()
            .map_or_else(|| Arc::new(CompoundShape::new()), Arc::clone)
    }

    /// Hole capsule, `None` without a drill.
    #[must_use]
    pub fn effective_hole_shape(&self) -> Option<Arc<Shape>> {
        self.effective_shapes().hole.clone()
    }

    /// Bounding box of every layer and the hole.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.effective_shapes().bbox
    }

    fn layer_polygons(&self, bias: ErrorLoc) -> Arc<LayerPolygons> {
        self.polygons[bias.index()].get_or_build(|| self.builder().build_effective_polygons(bias))
    }

    /// Effective polygon of `layer` for `bias`.
    #[must_use]
    pub fn effective_polygon(&self, layer: PcbLayer, bias: ErrorLoc) -> Arc<PolygonSet> {
        let polygons = self.layer_polygons(bias);
        let key = self.padstack.effective_layer_for(layer);
        if let Some(polygon) = polygons.per_layer.get(&key) {
            return Arc::clone(polygon);
        }

        tracing::error!(layer = %layer, key = %key, "No effective polygon built for layer");
        polygons
            .per_layer
            .values()
            .next()
            .map_or_else(|| Arc::new(PolygonSet::new()), Arc::clone)
    }

    /// Largest distance from the pad position to its outline, at least half
    /// the larger drill dimension.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.layer_polygons(ErrorLoc::Outside).bounding_radius
    }

    /// Outline of `layer` grown by `clearance`, uncached.
    #[must_use]
    pub fn transform_shape_to_polygon(
        &self,
        layer: PcbLayer,
        clearance: f64,
        max_error: f64,
        bias: ErrorLoc,
    ) -> PolygonSet {
        let settings = GeometrySettings {
            max_error,
            ..self.geometry
        };
        ShapeBuilder::new(&self.padstack, self.position, settings)
            .shape_to_polygon(layer, clearance, bias)
    }

    /// Hole grown by `clearance`, uncached; empty without a drill.
    #[must_use]
    pub fn transform_hole_to_polygon(
        &self,
        clearance: f64,
        max_error: f64,
        bias: ErrorLoc,
    ) -> PolygonSet {
        let settings = GeometrySettings {
            max_error,
            ..self.geometry
        };
        ShapeBuilder::new(&self.padstack, self.position, settings).hole_to_polygon(clearance, bias)
    }

    /// Anchor and primitives of a custom pad merged in the pad's local
    /// frame.
    #[must_use]
    pub fn merge_primitives_as_polygon(&self, layer: PcbLayer, bias: ErrorLoc) -> PolygonSet {
        self.builder().merge_primitives_as_polygon(layer, bias)
    }

    /// Outline a copper pour sees for a custom pad: the merged outline in
    /// board coordinates, or its convex hull.
    #[must_use]
    pub fn custom_shape_zone_outline(&self, layer: PcbLayer) -> PolygonSet {
        let outline = self
            .merge_primitives_as_polygon(layer, ErrorLoc::Inside)
            .rotated(Point::ZERO, self.orientation())
            .translated(self.shape_pos(layer));

        match self.padstack.custom_shape_zone_mode() {
            CustomShapeZoneMode::Outline => outline,
            CustomShapeZoneMode::ConvexHull => outline.convex_hull(),
        }
    }

    // ------------------------------------------------------------------
    // Zone layer overrides
    // ------------------------------------------------------------------

    /// Zone override of `layer`.
    #[must_use]
    pub fn zone_layer_override(&self, layer: PcbLayer) -> ZoneLayerOverride {
        self.zone_overrides.get(layer)
    }

    /// Sets the zone override of `layer`. Callable from fill threads.
    pub fn set_zone_layer_override(&self, layer: PcbLayer, value: ZoneLayerOverride) {
        self.zone_overrides.set(layer, value);
    }

    /// Resets every zone override.
    pub fn clear_zone_layer_overrides(&self) {
        self.zone_overrides.clear();
    }

    // ------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------

    /// Returns true when the next shape read rebuilds.
    #[must_use]
    pub fn is_geometry_dirty(&self) -> bool {
        self.shapes.is_dirty()
    }

    fn invalidate_geometry(&self) {
        self.shapes.invalidate();
        for cache in &self.polygons {
            cache.invalidate();
        }
    }

    fn update_shape_props<T: PartialEq>(
        &mut self,
        layer: PcbLayer,
        value: T,
        field: impl FnOnce(&mut ShapeProps) -> &mut T,
    ) {
        let changed = {
            let slot = field(self.padstack.shape_props_mut(layer));
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        };
        if changed {
            self.invalidate_geometry();
        }
    }
}
