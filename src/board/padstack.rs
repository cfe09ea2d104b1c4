//! Per-layer pad parameters.
//!
//! A [`Padstack`] is owned by exactly one pad. It stores one copper record
//! for every layer that can have its own geometry (a single record in
//! [`PadstackMode::Normal`]), front/back mask records, and the drill.
//!
//! The padstack itself never touches caches: all geometry-affecting writes
//! go through [`Pad`](super::pad::Pad), which invalidates the pad's shape and
//! polygon caches.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::layer::{LayerSet, PcbLayer};
use super::primitive::Primitive;
use crate::geometry::{mils_to_iu, Point};

/// Default corner radius ratio for rounded rectangles.
pub const DEFAULT_ROUND_RECT_RATIO: f64 = 0.25;

/// Default chamfer ratio for chamfered rectangles.
pub const DEFAULT_CHAMFER_RATIO: f64 = 0.2;

/// Upper bound for the corner radius and chamfer ratios.
pub const MAX_CORNER_RATIO: f64 = 0.5;

/// Pad outline kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PadShape {
    /// Circle of diameter `size.x`.
    #[default]
    #[serde(rename = "circle")]
    Circle,
    /// Oblong with round ends.
    #[serde(rename = "oval")]
    Oval,
    /// Rectangle.
    #[serde(rename = "rect")]
    Rect,
    /// Rectangle with rounded corners.
    #[serde(rename = "roundrect")]
    RoundRect,
    /// Rectangle with selected corners chamfered and the others rounded.
    #[serde(rename = "chamfered_rect")]
    ChamferedRect,
    /// Rectangle with opposite sides of different length.
    #[serde(rename = "trapezoid")]
    Trapezoid,
    /// Anchor shape plus arbitrary primitives.
    #[serde(rename = "custom")]
    Custom,
}

impl PadShape {
    /// Returns the stable textual token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Oval => "oval",
            Self::Rect => "rect",
            Self::RoundRect => "roundrect",
            Self::ChamferedRect => "chamfered_rect",
            Self::Trapezoid => "trapezoid",
            Self::Custom => "custom",
        }
    }

    /// Parses a shape from its token.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "circle" => Some(Self::Circle),
            "oval" => Some(Self::Oval),
            "rect" => Some(Self::Rect),
            "roundrect" => Some(Self::RoundRect),
            "chamfered_rect" => Some(Self::ChamferedRect),
            "trapezoid" => Some(Self::Trapezoid),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// How many distinct copper records a padstack holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadstackMode {
    /// One record for every copper layer.
    #[default]
    Normal,
    /// Front, inner (shared by all inner layers) and back records.
    FrontInnerBack,
    /// One record per copper layer.
    Custom,
}

impl PadstackMode {
    /// Returns the stable textual token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::FrontInnerBack => "front_inner_back",
            Self::Custom => "custom",
        }
    }
}

bitflags! {
    /// Corners of a chamfered rectangle, in the pad's unrotated frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ChamferPositions: u8 {
        /// Corner at (-x, -y).
        const TOP_LEFT = 1;
        /// Corner at (+x, -y).
        const TOP_RIGHT = 1 << 1;
        /// Corner at (-x, +y).
        const BOTTOM_LEFT = 1 << 2;
        /// Corner at (+x, +y).
        const BOTTOM_RIGHT = 1 << 3;
    }
}

impl ChamferPositions {
    /// Corner flags ordered top-left, top-right, bottom-right, bottom-left.
    #[must_use]
    pub const fn corner_flags(self) -> [bool; 4] {
        [
            self.contains(Self::TOP_LEFT),
            self.contains(Self::TOP_RIGHT),
            self.contains(Self::BOTTOM_RIGHT),
            self.contains(Self::BOTTOM_LEFT),
        ]
    }

    /// Swaps left and right corners.
    #[must_use]
    pub fn mirrored_left_right(self) -> Self {
        let mut out = Self::empty();
        out.set(Self::TOP_RIGHT, self.contains(Self::TOP_LEFT));
        out.set(Self::TOP_LEFT, self.contains(Self::TOP_RIGHT));
        out.set(Self::BOTTOM_RIGHT, self.contains(Self::BOTTOM_LEFT));
        out.set(Self::BOTTOM_LEFT, self.contains(Self::BOTTOM_RIGHT));
        out
    }
}

/// Copper-pour connection style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneConnection {
    /// Solid connection.
    Full,
    /// Thermal relief spokes.
    Thermal,
    /// Thermal relief for through-hole pads only, solid for SMD pads.
    ThtThermal,
    /// No connection to the pour.
    #[serde(rename = "none")]
    NotConnected,
}

/// Drill outline kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillShape {
    /// Round drill of diameter `size.x`.
    #[default]
    Circle,
    /// Slot.
    Oblong,
}

/// Drill geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrillProps {
    /// Drill shape.
    #[serde(default)]
    pub shape: DrillShape,
    /// Drill size. Zero for surface-mount pads.
    pub size: Point,
    /// First layer of a blind or buried drill; `None` means `F.Cu`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<PcbLayer>,
    /// Last layer of a blind or buried drill; `None` means `B.Cu`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<PcbLayer>,
}

impl DrillProps {
    /// No drill.
    pub const NONE: Self = Self {
        shape: DrillShape::Circle,
        size: Point::ZERO,
        start: None,
        end: None,
    };

    /// Round through-drill of `diameter`.
    #[must_use]
    pub const fn circle(diameter: f64) -> Self {
        Self {
            shape: DrillShape::Circle,
            size: Point::new(diameter, diameter),
            start: None,
            end: None,
        }
    }

    /// Returns true when both drill dimensions are positive.
    #[must_use]
    pub fn is_drilled(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    /// First drilled layer.
    #[must_use]
    pub fn start_layer(&self) -> PcbLayer {
        self.start.unwrap_or(PcbLayer::FCu)
    }

    /// Last drilled layer.
    #[must_use]
    pub fn end_layer(&self) -> PcbLayer {
        self.end.unwrap_or(PcbLayer::BCu)
    }
}

/// Policy for copper on layers where a through-hole pad has no connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnconnectedLayerMode {
    /// Copper on every layer.
    #[default]
    KeepAll,
    /// Copper only where connected.
    RemoveAll,
    /// Copper where connected and on the outer layers.
    RemoveExceptStartAndEnd,
    /// Copper on the outer layers only.
    StartEndOnly,
}

/// Outline used when a custom pad meets a copper pour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomShapeZoneMode {
    /// The merged outline itself.
    #[default]
    Outline,
    /// Its convex hull.
    ConvexHull,
}

/// Outline parameters of one copper record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeProps {
    /// Outline kind.
    pub shape: PadShape,
    /// Anchor kind for custom pads: [`PadShape::Circle`] or [`PadShape::Rect`].
    #[serde(default)]
    pub anchor_shape: PadShape,
    /// Width and height.
    pub size: Point,
    /// Offset of the shape from the pad position, before rotation.
    #[serde(default)]
    pub offset: Point,
    /// Corner radius as a fraction of the smaller side.
    #[serde(default = "default_round_rect_ratio")]
    pub round_rect_ratio: f64,
    /// Chamfer length as a fraction of the smaller side.
    #[serde(default = "default_chamfer_ratio")]
    pub chamfer_ratio: f64,
    /// Chamfered corners.
    #[serde(default)]
    pub chamfer_positions: ChamferPositions,
    /// Trapezoid delta: X changes the side heights, Y the top/bottom widths.
    #[serde(default)]
    pub trapezoid_delta: Point,
}

const fn default_round_rect_ratio() -> f64 {
    DEFAULT_ROUND_RECT_RATIO
}

const fn default_chamfer_ratio() -> f64 {
    DEFAULT_CHAMFER_RATIO
}

impl Default for ShapeProps {
    fn default() -> Self {
        let size = mils_to_iu(60.0);
        Self {
            shape: PadShape::Circle,
            anchor_shape: PadShape::Circle,
            size: Point::new(size, size),
            offset: Point::ZERO,
            round_rect_ratio: DEFAULT_ROUND_RECT_RATIO,
            chamfer_ratio: DEFAULT_CHAMFER_RATIO,
            chamfer_positions: ChamferPositions::empty(),
            trapezoid_delta: Point::ZERO,
        }
    }
}

impl ShapeProps {
    /// Corner radius derived from the ratio and the smaller side.
    #[must_use]
    pub fn round_rect_radius(&self) -> f64 {
        let min_side = self.size.x.min(self.size.y);
        (self.round_rect_ratio * min_side).min(min_side / 2.0)
    }
}

/// Everything a copper layer record holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CopperLayerProps {
    /// Outline parameters.
    #[serde(flatten)]
    pub shape: ShapeProps,
    /// Local clearance override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance: Option<f64>,
    /// Zone connection override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_connection: Option<ZoneConnection>,
    /// Thermal spoke width override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_spoke_width: Option<f64>,
    /// Thermal spoke angle override, in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_spoke_angle: Option<f64>,
    /// Thermal gap override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_gap: Option<f64>,
    /// Primitives of a custom pad, in the pad's unrotated frame.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primitives: Vec<Primitive>,
}

/// Mask and paste overrides for one board side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskLayerProps {
    /// Solder mask expansion override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_mask_margin: Option<f64>,
    /// Solder paste absolute margin override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_paste_margin: Option<f64>,
    /// Solder paste margin as a fraction of the pad size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_paste_margin_ratio: Option<f64>,
    /// Forces the mask opening on or off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_solder_mask: Option<bool>,
    /// Forces the paste opening on or off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_solder_paste: Option<bool>,
}

/// Per-layer parameter store of one pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Padstack {
    #[serde(default)]
    mode: PadstackMode,
    #[serde(default)]
    orientation: f64,
    layer_set: LayerSet,
    #[serde(default = "default_copper_layer_count")]
    copper_layer_count: usize,
    front_copper: CopperLayerProps,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    other_copper: BTreeMap<PcbLayer, CopperLayerProps>,
    #[serde(default)]
    front_mask: MaskLayerProps,
    #[serde(default)]
    back_mask: MaskLayerProps,
    drill: DrillProps,
    #[serde(default)]
    unconnected_layer_mode: UnconnectedLayerMode,
    #[serde(default)]
    custom_shape_zone_mode: CustomShapeZoneMode,
}

const fn default_copper_layer_count() -> usize {
    2
}

impl Default for Padstack {
    fn default() -> Self {
        Self::new()
    }
}

impl Padstack {
    /// A through-hole padstack: 60 mil circle on every copper layer with a
    /// 30 mil drill.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: PadstackMode::Normal,
            orientation: 0.0,
            layer_set: LayerSet::pth_mask(),
            copper_layer_count: default_copper_layer_count(),
            front_copper: CopperLayerProps::default(),
            other_copper: BTreeMap::new(),
            front_mask: MaskLayerProps::default(),
            back_mask: MaskLayerProps::default(),
            drill: DrillProps::circle(mils_to_iu(30.0)),
            unconnected_layer_mode: UnconnectedLayerMode::KeepAll,
            custom_shape_zone_mode: CustomShapeZoneMode::Outline,
        }
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> PadstackMode {
        self.mode
    }

    /// Switches mode.
    ///
    /// Layers that become distinct start as copies of the record that used
    /// to describe them. Switching to [`PadstackMode::Normal`] keeps only the
    /// front record.
    pub fn set_mode(&mut self, mode: PadstackMode) {
        if mode == self.mode {
            return;
        }

        let previous: BTreeMap<PcbLayer, CopperLayerProps> = self
            .distinct_keys(mode)
            .into_iter()
            .filter(|l| *l != PcbLayer::FCu)
            .map(|l| (l, self.copper_layer(l).clone()))
            .collect();

        self.mode = mode;
        self.other_copper = previous;
    }

    /// Copper layers that own a record in `mode`.
    fn distinct_keys(&self, mode: PadstackMode) -> Vec<PcbLayer> {
        match mode {
            PadstackMode::Normal => vec![PcbLayer::FCu],
            PadstackMode::FrontInnerBack => vec![PcbLayer::FCu, PcbLayer::In(1), PcbLayer::BCu],
            PadstackMode::Custom => PcbLayer::copper_stack(self.copper_layer_count),
        }
    }

    /// The layer whose record describes `layer`.
    ///
    /// Technical layers map to the outer copper layer of their side.
    #[must_use]
    pub fn effective_layer_for(&self, layer: PcbLayer) -> PcbLayer {
        let side = if layer.is_back_tech() {
            PcbLayer::BCu
        } else if layer.is_front_tech() {
            PcbLayer::FCu
        } else {
            layer
        };

        match self.mode {
            PadstackMode::Normal => PcbLayer::FCu,
            PadstackMode::FrontInnerBack => match side {
                PcbLayer::In(_) => PcbLayer::In(1),
                PcbLayer::BCu => PcbLayer::BCu,
                _ => PcbLayer::FCu,
            },
            PadstackMode::Custom => side,
        }
    }

    /// Distinct geometry records, front to back.
    ///
    /// In custom mode, only copper layers the pad is on and the board has
    /// are listed; `F.Cu` stands in when there are none.
    #[must_use]
    pub fn unique_layers(&self) -> Vec<PcbLayer> {
        match self.mode {
            PadstackMode::Normal => vec![PcbLayer::FCu],
            PadstackMode::FrontInnerBack => vec![PcbLayer::FCu, PcbLayer::In(1), PcbLayer::BCu],
            PadstackMode::Custom => {
                let layers: Vec<PcbLayer> = PcbLayer::copper_stack(self.copper_layer_count)
                    .into_iter()
                    .filter(|l| self.layer_set.contains(*l))
                    .collect();
                if layers.is_empty() {
                    vec![PcbLayer::FCu]
                } else {
                    layers
                }
            }
        }
    }

    /// Calls `f` once per distinct geometry record.
    pub fn for_each_unique_layer(&self, mut f: impl FnMut(PcbLayer)) {
        for layer in self.unique_layers() {
            f(layer);
        }
    }

    /// Copper record describing `layer`.
    #[must_use]
    pub fn copper_layer(&self, layer: PcbLayer) -> &CopperLayerProps {
        match self.effective_layer_for(layer) {
            PcbLayer::FCu => &self.front_copper,
            key => self.other_copper.get(&key).unwrap_or(&self.front_copper),
        }
    }

    /// Mutable copper record describing `layer`, created from the front
    /// record when missing.
    pub fn copper_layer_mut(&mut self, layer: PcbLayer) -> &mut CopperLayerProps {
        match self.effective_layer_for(layer) {
            PcbLayer::FCu => &mut self.front_copper,
            key => {
                let front = &self.front_copper;
                self.other_copper.entry(key).or_insert_with(|| front.clone())
            }
        }
    }

    /// Outline parameters describing `layer`.
    #[must_use]
    pub fn shape_props(&self, layer: PcbLayer) -> &ShapeProps {
        &self.copper_layer(layer).shape
    }

    /// Mutable outline parameters describing `layer`.
    pub fn shape_props_mut(&mut self, layer: PcbLayer) -> &mut ShapeProps {
        &mut self.copper_layer_mut(layer).shape
    }

    /// Applies `f` to every distinct copper record.
    pub fn for_each_copper_layer_mut(&mut self, mut f: impl FnMut(&mut CopperLayerProps)) {
        f(&mut self.front_copper);
        for props in self.other_copper.values_mut() {
            f(props);
        }
    }

    /// Mask record for the side of `layer`. Inner layers use the front record.
    #[must_use]
    pub fn mask_layer(&self, layer: PcbLayer) -> &MaskLayerProps {
        if layer.is_back() {
            &self.back_mask
        } else {
            &self.front_mask
        }
    }

    /// Mutable mask record for the side of `layer`.
    pub fn mask_layer_mut(&mut self, layer: PcbLayer) -> &mut MaskLayerProps {
        if layer.is_back() {
            &mut self.back_mask
        } else {
            &mut self.front_mask
        }
    }

    /// Orientation in degrees.
    #[must_use]
    pub const fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Sets the orientation, normalised to [0, 360).
    pub fn set_orientation(&mut self, degrees: f64) {
        self.orientation = degrees.rem_euclid(360.0);
    }

    /// Layers the pad is on.
    #[must_use]
    pub const fn layer_set(&self) -> LayerSet {
        self.layer_set
    }

    /// Sets the layers the pad is on.
    pub fn set_layer_set(&mut self, layers: LayerSet) {
        self.layer_set = layers;
    }

    /// Number of copper layers on the board the padstack is used with.
    #[must_use]
    pub const fn copper_layer_count(&self) -> usize {
        self.copper_layer_count
    }

    /// Sets the copper layer count.
    pub fn set_copper_layer_count(&mut self, count: usize) {
        self.copper_layer_count = count;
    }

    /// Drill geometry.
    #[must_use]
    pub const fn drill(&self) -> &DrillProps {
        &self.drill
    }

    /// Mutable drill geometry.
    pub fn drill_mut(&mut self) -> &mut DrillProps {
        &mut self.drill
    }

    /// Unconnected layer policy.
    #[must_use]
    pub const fn unconnected_layer_mode(&self) -> UnconnectedLayerMode {
        self.unconnected_layer_mode
    }

    /// Sets the unconnected layer policy.
    pub fn set_unconnected_layer_mode(&mut self, mode: UnconnectedLayerMode) {
        self.unconnected_layer_mode = mode;
    }

    /// Custom shape zone outline policy.
    #[must_use]
    pub const fn custom_shape_zone_mode(&self) -> CustomShapeZoneMode {
        self.custom_shape_zone_mode
    }

    /// Sets the custom shape zone outline policy.
    pub fn set_custom_shape_zone_mode(&mut self, mode: CustomShapeZoneMode) {
        self.custom_shape_zone_mode = mode;
    }

    /// Moves every record to the other board side: front and back records
    /// (copper and mask) trade places and inner layers are mirrored through
    /// the stack.
    pub fn flip_layers(&mut self, copper_layer_count: usize) {
        std::mem::swap(&mut self.front_mask, &mut self.back_mask);

        match self.mode {
            PadstackMode::Normal => {}
            PadstackMode::FrontInnerBack => {
                if let Some(back) = self.other_copper.get_mut(&PcbLayer::BCu) {
                    std::mem::swap(back, &mut self.front_copper);
                }
            }
            PadstackMode::Custom => {
                let mut all: BTreeMap<PcbLayer, CopperLayerProps> =
                    std::mem::take(&mut self.other_copper);
                all.insert(PcbLayer::FCu, self.front_copper.clone());
                let mut flipped: BTreeMap<PcbLayer, CopperLayerProps> = all
                    .into_iter()
                    .map(|(layer, props)| (layer.flipped(copper_layer_count), props))
                    .collect();
                if let Some(front) = flipped.remove(&PcbLayer::FCu) {
                    self.front_copper = front;
                }
                self.other_copper = flipped;
            }
        }

        if let Some(start) = self.drill.start {
            self.drill.start = Some(start.flipped(copper_layer_count));
        }
        if let Some(end) = self.drill.end {
            self.drill.end = Some(end.flipped(copper_layer_count));
        }
        if self.drill.start.is_some() || self.drill.end.is_some() {
            let start = self.drill.start_layer();
            let end = self.drill.end_layer();
            if start.index() > end.index() {
                self.drill.start = Some(end);
                self.drill.end = Some(start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_tokens_roundtrip() {
        for shape in [
            PadShape::Circle,
            PadShape::Oval,
            PadShape::Rect,
            PadShape::RoundRect,
            PadShape::ChamferedRect,
            PadShape::Trapezoid,
            PadShape::Custom,
        ] {
            assert_eq!(PadShape::parse(shape.as_str()), Some(shape));
            let json = serde_json::to_string(&shape).unwrap();
            assert_eq!(json, format!("\"{}\"", shape.as_str()));
        }
        assert_eq!(PadShape::parse("square"), None);
    }

    #[test]
    fn normal_mode_has_one_record() {
        let ps = Padstack::new();
        assert_eq!(ps.unique_layers(), vec![PcbLayer::FCu]);
        assert_eq!(ps.effective_layer_for(PcbLayer::BCu), PcbLayer::FCu);
        assert_eq!(ps.effective_layer_for(PcbLayer::In(4)), PcbLayer::FCu);
    }

    #[test]
    fn front_inner_back_copies_records() {
        let mut ps = Padstack::new();
        ps.shape_props_mut(PcbLayer::FCu).size = Point::new(1.0e6, 2.0e6);
        ps.set_mode(PadstackMode::FrontInnerBack);

        assert_eq!(ps.unique_layers().len(), 3);
        assert_eq!(ps.effective_layer_for(PcbLayer::In(7)), PcbLayer::In(1));
        assert_eq!(ps.effective_layer_for(PcbLayer::BMask), PcbLayer::BCu);
        assert_eq!(ps.shape_props(PcbLayer::In(3)).size, Point::new(1.0e6, 2.0e6));

        ps.shape_props_mut(PcbLayer::BCu).size = Point::new(3.0e6, 3.0e6);
        assert_eq!(ps.shape_props(PcbLayer::FCu).size, Point::new(1.0e6, 2.0e6));
        assert_eq!(ps.shape_props(PcbLayer::BPaste).size, Point::new(3.0e6, 3.0e6));
    }

    #[test]
    fn custom_mode_inherits_inner_record() {
        let mut ps = Padstack::new();
        ps.set_copper_layer_count(4);
        ps.set_mode(PadstackMode::FrontInnerBack);
        ps.shape_props_mut(PcbLayer::In(1)).shape = PadShape::Rect;
        ps.set_mode(PadstackMode::Custom);

        assert_eq!(ps.shape_props(PcbLayer::In(2)).shape, PadShape::Rect);
        assert_eq!(ps.shape_props(PcbLayer::BCu).shape, PadShape::Circle);
        assert_eq!(
            ps.unique_layers(),
            vec![PcbLayer::FCu, PcbLayer::In(1), PcbLayer::In(2), PcbLayer::BCu]
        );
    }

    #[test]
    fn back_to_normal_drops_records() {
        let mut ps = Padstack::new();
        ps.set_mode(PadstackMode::FrontInnerBack);
        ps.shape_props_mut(PcbLayer::BCu).shape = PadShape::Oval;
        ps.set_mode(PadstackMode::Normal);
        assert_eq!(ps.shape_props(PcbLayer::BCu).shape, PadShape::Circle);
        ps.set_mode(PadstackMode::FrontInnerBack);
        assert_eq!(ps.shape_props(PcbLayer::BCu).shape, PadShape::Circle);
    }

    #[test]
    fn custom_mode_skips_layers_not_on_pad() {
        let mut ps = Padstack::new();
        ps.set_layer_set(LayerSet::smd_mask());
        ps.set_mode(PadstackMode::Custom);
        assert_eq!(ps.unique_layers(), vec![PcbLayer::FCu]);
    }

    #[test]
    fn chamfer_mirror_swaps_sides() {
        let corners = ChamferPositions::TOP_LEFT | ChamferPositions::BOTTOM_LEFT;
        let mirrored = corners.mirrored_left_right();
        assert_eq!(
            mirrored,
            ChamferPositions::TOP_RIGHT | ChamferPositions::BOTTOM_RIGHT
        );
        assert_eq!(corners.corner_flags(), [true, false, false, true]);
    }

    #[test]
    fn flip_swaps_front_and_back_records() {
        let mut ps = Padstack::new();
        ps.set_mode(PadstackMode::FrontInnerBack);
        ps.shape_props_mut(PcbLayer::BCu).shape = PadShape::Rect;
        ps.mask_layer_mut(PcbLayer::FMask).solder_mask_margin = Some(1000.0);
        ps.flip_layers(2);
        assert_eq!(ps.shape_props(PcbLayer::FCu).shape, PadShape::Rect);
        assert_eq!(ps.shape_props(PcbLayer::BCu).shape, PadShape::Circle);
        assert_eq!(ps.mask_layer(PcbLayer::BCu).solder_mask_margin, Some(1000.0));
        assert_eq!(ps.mask_layer(PcbLayer::FCu).solder_mask_margin, None);
    }

    #[test]
    fn padstack_serde_roundtrip() {
        let mut ps = Padstack::new();
        ps.set_mode(PadstackMode::FrontInnerBack);
        ps.shape_props_mut(PcbLayer::BCu).shape = PadShape::RoundRect;
        let json = serde_json::to_string(&ps).unwrap();
        assert!(json.contains("\"B.Cu\""));
        let back: Padstack = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ps);
    }
}
