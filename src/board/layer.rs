//! Board layers and layer sets.
//!
//! Copper layers run from `F.Cu` through the inner layers `In1.Cu`..`In30.Cu`
//! to `B.Cu`. Technical layers (mask, paste, silkscreen) come in front/back
//! pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::PadError;
use super::pad::Pad;

/// Maximum number of copper layers.
pub const MAX_COPPER_LAYERS: usize = 32;

/// Number of inner copper layers.
pub const MAX_INNER_LAYERS: u8 = 30;

const INNER_NAMES: [&str; MAX_INNER_LAYERS as usize] = [
    "In1.Cu", "In2.Cu", "In3.Cu", "In4.Cu", "In5.Cu", "In6.Cu", "In7.Cu", "In8.Cu", "In9.Cu",
    "In10.Cu", "In11.Cu", "In12.Cu", "In13.Cu", "In14.Cu", "In15.Cu", "In16.Cu", "In17.Cu",
    "In18.Cu", "In19.Cu", "In20.Cu", "In21.Cu", "In22.Cu", "In23.Cu", "In24.Cu", "In25.Cu",
    "In26.Cu", "In27.Cu", "In28.Cu", "In29.Cu", "In30.Cu",
];

/// A board layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PcbLayer {
    /// Front copper.
    FCu,
    /// Inner copper layer, numbered 1..=30 from the front.
    In(u8),
    /// Back copper.
    BCu,
    /// Front solder mask.
    FMask,
    /// Back solder mask.
    BMask,
    /// Front solder paste.
    FPaste,
    /// Back solder paste.
    BPaste,
    /// Front silkscreen.
    FSilkS,
    /// Back silkscreen.
    BSilkS,
}

impl PcbLayer {
    /// Returns the layer name string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FCu => "F.Cu",
            Self::In(n) => {
                if *n >= 1 && *n <= MAX_INNER_LAYERS {
                    INNER_NAMES[(*n - 1) as usize]
                } else {
                    "In?.Cu"
                }
            }
            Self::BCu => "B.Cu",
            Self::FMask => "F.Mask",
            Self::BMask => "B.Mask",
            Self::FPaste => "F.Paste",
            Self::BPaste => "B.Paste",
            Self::FSilkS => "F.SilkS",
            Self::BSilkS => "B.SilkS",
        }
    }

    /// Parses a layer from its name string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "F.Cu" => Some(Self::FCu),
            "B.Cu" => Some(Self::BCu),
            "F.Mask" => Some(Self::FMask),
            "B.Mask" => Some(Self::BMask),
            "F.Paste" => Some(Self::FPaste),
            "B.Paste" => Some(Self::BPaste),
            "F.SilkS" => Some(Self::FSilkS),
            "B.SilkS" => Some(Self::BSilkS),
            _ => {
                let n: u8 = s.strip_prefix("In")?.strip_suffix(".Cu")?.parse().ok()?;
                Self::inner(n)
            }
        }
    }

    /// Inner copper layer `n`, if `n` is within 1..=30.
    #[must_use]
    pub const fn inner(n: u8) -> Option<Self> {
        if n >= 1 && n <= MAX_INNER_LAYERS {
            Some(Self::In(n))
        } else {
            None
        }
    }

    /// Bit index of the layer within a [`LayerSet`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::FCu => 0,
            Self::In(n) => n as usize,
            Self::BCu => 31,
            Self::FMask => 32,
            Self::BMask => 33,
            Self::FPaste => 34,
            Self::BPaste => 35,
            Self::FSilkS => 36,
            Self::BSilkS => 37,
        }
    }

    /// Layer for a bit index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::FCu),
            #[allow(clippy::cast_possible_truncation)]
            1..=30 => Some(Self::In(index as u8)),
            31 => Some(Self::BCu),
            32 => Some(Self::FMask),
            33 => Some(Self::BMask),
            34 => Some(Self::FPaste),
            35 => Some(Self::BPaste),
            36 => Some(Self::FSilkS),
            37 => Some(Self::BSilkS),
            _ => None,
        }
    }

    /// Index into per-copper-layer storage, `None` for technical layers.
    #[must_use]
    pub const fn copper_index(self) -> Option<usize> {
        if self.is_copper() {
            Some(self.index())
        } else {
            None
        }
    }

    /// Returns true for copper layers.
    #[must_use]
    pub const fn is_copper(self) -> bool {
        matches!(self, Self::FCu | Self::In(_) | Self::BCu)
    }

    /// Returns true for `F.Cu` and `B.Cu`.
    #[must_use]
    pub const fn is_external_copper(self) -> bool {
        matches!(self, Self::FCu | Self::BCu)
    }

    /// Returns true for inner copper layers.
    #[must_use]
    pub const fn is_inner(self) -> bool {
        matches!(self, Self::In(_))
    }

    /// Returns true for front-side layers (copper and technical).
    #[must_use]
    pub const fn is_front(self) -> bool {
        matches!(self, Self::FCu | Self::FMask | Self::FPaste | Self::FSilkS)
    }

    /// Returns true for back-side layers (copper and technical).
    #[must_use]
    pub const fn is_back(self) -> bool {
        matches!(self, Self::BCu | Self::BMask | Self::BPaste | Self::BSilkS)
    }

    /// Returns true for front technical layers.
    #[must_use]
    pub const fn is_front_tech(self) -> bool {
        matches!(self, Self::FMask | Self::FPaste | Self::FSilkS)
    }

    /// Returns true for back technical layers.
    #[must_use]
    pub const fn is_back_tech(self) -> bool {
        matches!(self, Self::BMask | Self::BPaste | Self::BSilkS)
    }

    /// The matching layer on the other side of a board with
    /// `copper_layer_count` copper layers. Inner layers are mirrored through
    /// the middle of the stack.
    #[must_use]
    pub fn flipped(self, copper_layer_count: usize) -> Self {
        match self {
            Self::FCu => Self::BCu,
            Self::BCu => Self::FCu,
            Self::In(n) => {
                let inner_count = copper_layer_count.saturating_sub(2);
                let n = usize::from(n);
                if n <= inner_count {
                    #[allow(clippy::cast_possible_truncation)]
                    Self::In((inner_count + 1 - n) as u8)
                } else {
                    self
                }
            }
            Self::FMask => Self::BMask,
            Self::BMask => Self::FMask,
            Self::FPaste => Self::BPaste,
            Self::BPaste => Self::FPaste,
            Self::FSilkS => Self::BSilkS,
            Self::BSilkS => Self::FSilkS,
        }
    }

    /// Copper layers of a board with `copper_layer_count` layers, front to back.
    #[must_use]
    pub fn copper_stack(copper_layer_count: usize) -> Vec<Self> {
        let count = copper_layer_count.clamp(2, MAX_COPPER_LAYERS);
        let mut layers = Vec::with_capacity(count);
        layers.push(Self::FCu);
        #[allow(clippy::cast_possible_truncation)]
        layers.extend((1..=count - 2).map(|n| Self::In(n as u8)));
        layers.push(Self::BCu);
        layers
    }
}

impl fmt::Display for PcbLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PcbLayer {
    type Error = PadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| PadError::unknown_layer(value))
    }
}

impl From<PcbLayer> for String {
    fn from(layer: PcbLayer) -> Self {
        layer.as_str().to_string()
    }
}

const ALL_COPPER_BITS: u64 = (1 << MAX_COPPER_LAYERS) - 1;

/// A set of layers, iterated front copper first, then inner layers, back
/// copper and technical layers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PcbLayer>", into = "Vec<PcbLayer>")]
pub struct LayerSet(u64);

impl LayerSet {
    /// The empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Every copper layer.
    #[must_use]
    pub const fn all_copper() -> Self {
        Self(ALL_COPPER_BITS)
    }

    /// Inner copper layers only.
    #[must_use]
    pub const fn internal_copper() -> Self {
        Self(ALL_COPPER_BITS & !(1 << 0) & !(1 << 31))
    }

    /// Front and back copper.
    #[must_use]
    pub const fn external_copper() -> Self {
        Self::new().with(PcbLayer::FCu).with(PcbLayer::BCu)
    }

    /// Layers of a plated through-hole pad: all copper and both masks.
    #[must_use]
    pub const fn pth_mask() -> Self {
        Self::all_copper().with(PcbLayer::FMask).with(PcbLayer::BMask)
    }

    /// Layers of a surface-mount pad: front copper, paste and mask.
    #[must_use]
    pub const fn smd_mask() -> Self {
        Self::new()
            .with(PcbLayer::FCu)
            .with(PcbLayer::FPaste)
            .with(PcbLayer::FMask)
    }

    /// Layers of an edge-connector pad: front copper and mask.
    #[must_use]
    pub const fn conn_smd_mask() -> Self {
        Self::new().with(PcbLayer::FCu).with(PcbLayer::FMask)
    }

    /// Layers of a non-plated hole: outer copper and both masks.
    #[must_use]
    pub const fn unplated_hole_mask() -> Self {
        Self::external_copper()
            .with(PcbLayer::FMask)
            .with(PcbLayer::BMask)
    }

    /// Front technical layers.
    #[must_use]
    pub const fn front_tech() -> Self {
        Self::new()
            .with(PcbLayer::FMask)
            .with(PcbLayer::FPaste)
            .with(PcbLayer::FSilkS)
    }

    /// Back technical layers.
    #[must_use]
    pub const fn back_tech() -> Self {
        Self::new()
            .with(PcbLayer::BMask)
            .with(PcbLayer::BPaste)
            .with(PcbLayer::BSilkS)
    }

    /// Copper layers present on a board with `copper_layer_count` layers.
    #[must_use]
    pub fn board_copper(copper_layer_count: usize) -> Self {
        PcbLayer::copper_stack(copper_layer_count).into_iter().collect()
    }

    /// Returns a copy with `layer` added.
    #[must_use]
    pub const fn with(self, layer: PcbLayer) -> Self {
        Self(self.0 | (1 << layer.index()))
    }

    /// Adds a layer.
    pub fn insert(&mut self, layer: PcbLayer) {
        self.0 |= 1 << layer.index();
    }

    /// Removes a layer.
    pub fn remove(&mut self, layer: PcbLayer) {
        self.0 &= !(1 << layer.index());
    }

    /// Returns true when `layer` is in the set.
    #[must_use]
    pub const fn contains(self, layer: PcbLayer) -> bool {
        self.0 & (1 << layer.index()) != 0
    }

    /// Returns true when the set has no layers.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of layers in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Layers in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Layers in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Layers in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// The copper layers of this set.
    #[must_use]
    pub const fn copper(self) -> Self {
        self.intersection(Self::all_copper())
    }

    /// Returns true when the set holds at least one copper layer.
    #[must_use]
    pub const fn has_copper(self) -> bool {
        !self.copper().is_empty()
    }

    /// The first layer in iteration order.
    #[must_use]
    pub fn first(self) -> Option<PcbLayer> {
        self.iter().next()
    }

    /// Iterates the layers in stable order.
    pub fn iter(self) -> impl Iterator<Item = PcbLayer> {
        (0..64).filter_map(move |i| {
            if self.0 & (1 << i) != 0 {
                PcbLayer::from_index(i)
            } else {
                None
            }
        })
    }

    /// The same set with every layer moved to the other board side.
    #[must_use]
    pub fn flipped(self, copper_layer_count: usize) -> Self {
        self.iter().map(|l| l.flipped(copper_layer_count)).collect()
    }
}

impl FromIterator<PcbLayer> for LayerSet {
    fn from_iter<I: IntoIterator<Item = PcbLayer>>(iter: I) -> Self {
        let mut set = Self::new();
        for layer in iter {
            set.insert(layer);
        }
        set
    }
}

impl From<Vec<PcbLayer>> for LayerSet {
    fn from(layers: Vec<PcbLayer>) -> Self {
        layers.into_iter().collect()
    }
}

impl From<LayerSet> for Vec<PcbLayer> {
    fn from(set: LayerSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for LayerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|l| l.as_str())).finish()
    }
}

/// Read-only view of the board a pad belongs to.
///
/// Pads work without a board; every query that can use one takes it as an
/// optional argument.
pub trait BoardContext: Send + Sync {
    /// Number of copper layers on the board.
    fn copper_layer_count(&self) -> usize;

    /// Layers enabled on the board.
    fn enabled_layers(&self) -> LayerSet;

    /// Returns true when something other than a zone connects to `pad` on
    /// `layer`.
    fn is_connected_on_layer(&self, pad: &Pad, layer: PcbLayer) -> bool;
}

/// A fixed board description with a per-layer connectivity answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBoard {
    copper_layer_count: usize,
    enabled: LayerSet,
    connected: LayerSet,
}

impl StaticBoard {
    /// A board with `copper_layer_count` copper layers, all technical layers
    /// enabled and nothing connected.
    #[must_use]
    pub fn new(copper_layer_count: usize) -> Self {
        Self {
            copper_layer_count,
            enabled: LayerSet::board_copper(copper_layer_count)
                .union(LayerSet::front_tech())
                .union(LayerSet::back_tech()),
            connected: LayerSet::new(),
        }
    }

    /// Marks `layer` as connected for every pad.
    #[must_use]
    pub fn with_connection(mut self, layer: PcbLayer) -> Self {
        self.connected.insert(layer);
        self
    }
}

impl BoardContext for StaticBoard {
    fn copper_layer_count(&self) -> usize {
        self.copper_layer_count
    }

    fn enabled_layers(&self) -> LayerSet {
        self.enabled
    }

    fn is_connected_on_layer(&self, _pad: &Pad, layer: PcbLayer) -> bool {
        self.connected.contains(layer)
    }
}
