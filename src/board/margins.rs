//! Clearance and margin resolution.
//!
//! Every quantity walks the same chain and stops at the first value found:
//!
//! 1. the padstack's per-layer override;
//! 2. the pad-level override;
//! 3. the parent footprint's default;
//! 4. the injected [`RuleEvaluator`];
//! 5. a built-in default.
//!
//! Footprint defaults and the rule evaluator are passed per call through a
//! [`ResolveContext`]. An empty context is a normal case and resolves from
//! local overrides only.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::layer::PcbLayer;
use super::pad::{Pad, PadAttribute};
use super::padstack::{PadShape, ZoneConnection};
use crate::geometry::{mm_to_iu, Point};

/// Thermal relief gap used when nothing else provides one.
pub const DEFAULT_THERMAL_GAP_MM: f64 = 0.5;

/// Thermal spoke width used when nothing else provides one.
pub const DEFAULT_THERMAL_SPOKE_WIDTH_MM: f64 = 0.5;

/// Constraint kinds a rule evaluator is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Copper-to-copper clearance.
    Clearance,
    /// Clearance around a non-plated hole.
    HoleClearance,
    /// Solder mask expansion.
    SolderMaskExpansion,
    /// Absolute solder paste margin.
    SolderPasteAbsMargin,
    /// Solder paste margin relative to the pad size.
    SolderPasteRelMargin,
    /// Zone connection style.
    ZoneConnection,
    /// Thermal relief gap.
    ThermalReliefGap,
    /// Thermal spoke width.
    ThermalSpokeWidth,
}

/// Answer of a rule evaluator. Unset fields mean "no opinion".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraint {
    /// Minimum value.
    pub min: Option<f64>,
    /// Preferred value.
    pub opt: Option<f64>,
    /// Zone connection style.
    pub zone_connection: Option<ZoneConnection>,
    /// Name of the rule that produced the constraint.
    pub name: String,
}

impl Constraint {
    /// A constraint with only a minimum.
    #[must_use]
    pub fn with_min(name: impl Into<String>, min: f64) -> Self {
        Self {
            min: Some(min),
            name: name.into(),
            ..Self::default()
        }
    }

    /// A constraint with only a preferred value.
    #[must_use]
    pub fn with_opt(name: impl Into<String>, opt: f64) -> Self {
        Self {
            opt: Some(opt),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Design rule engine capability.
pub trait RuleEvaluator: Send + Sync {
    /// Evaluates `kind` for `pad` (against `other` when given) on `layer`.
    fn evaluate(
        &self,
        kind: ConstraintKind,
        pad: &Pad,
        other: Option<&Pad>,
        layer: PcbLayer,
    ) -> Constraint;
}

/// Margin defaults of the footprint a pad belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FootprintDefaults {
    /// Copper clearance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance: Option<f64>,
    /// Solder mask expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_mask_margin: Option<f64>,
    /// Solder paste absolute margin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_paste_margin: Option<f64>,
    /// Solder paste relative margin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solder_paste_margin_ratio: Option<f64>,
    /// Zone connection style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_connection: Option<ZoneConnection>,
    /// Thermal relief gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_gap: Option<f64>,
    /// Thermal spoke width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_spoke_width: Option<f64>,
}

/// Collaborators consulted at the end of the override chain.
#[derive(Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    /// Parent footprint defaults.
    pub footprint: Option<&'a FootprintDefaults>,
    /// Rule engine.
    pub rules: Option<&'a dyn RuleEvaluator>,
}

impl<'a> ResolveContext<'a> {
    /// No footprint, no rules.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            footprint: None,
            rules: None,
        }
    }

    /// Adds footprint defaults.
    #[must_use]
    pub const fn with_footprint(mut self, footprint: &'a FootprintDefaults) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// Adds a rule evaluator.
    #[must_use]
    pub const fn with_rules(mut self, rules: &'a dyn RuleEvaluator) -> Self {
        self.rules = Some(rules);
        self
    }

    fn evaluate(&self, kind: ConstraintKind, pad: &Pad, layer: PcbLayer) -> Option<Constraint> {
        self.rules.map(|rules| rules.evaluate(kind, pad, None, layer))
    }
}

impl fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("footprint", &self.footprint)
            .field("rules", &self.rules.is_some())
            .finish()
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarginSource {
    /// Per-layer padstack override.
    PadstackLayer,
    /// Pad-level override.
    Pad,
    /// Parent footprint default.
    Footprint,
    /// A design rule, by name.
    Rule(String),
    /// Built-in default.
    Default,
}

impl fmt::Display for MarginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PadstackLayer => f.write_str("padstack layer override"),
            Self::Pad => f.write_str("pad override"),
            Self::Footprint => f.write_str("parent footprint"),
            Self::Rule(name) => write!(f, "rule '{name}'"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// A resolved value and its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The value.
    pub value: T,
    /// Where it came from.
    pub source: MarginSource,
}

impl<T> Resolved<T> {
    const fn new(value: T, source: MarginSource) -> Self {
        Self { value, source }
    }
}

/// Resolved solder paste margin.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteMargin {
    /// Per-axis margin after clamping.
    pub value: Point,
    /// The absolute part.
    pub margin: Resolved<f64>,
    /// The relative part.
    pub ratio: Resolved<f64>,
}

/// Walks the local part of the chain, then the rules, then the default.
fn resolve(
    padstack: Option<f64>,
    pad: Option<f64>,
    footprint: Option<f64>,
    rule: impl FnOnce() -> Option<(f64, String)>,
    default: f64,
) -> Resolved<f64> {
    if let Some(v) = padstack {
        return Resolved::new(v, MarginSource::PadstackLayer);
    }
    if let Some(v) = pad {
        return Resolved::new(v, MarginSource::Pad);
    }
    if let Some(v) = footprint {
        return Resolved::new(v, MarginSource::Footprint);
    }
    if let Some((v, name)) = rule() {
        return Resolved::new(v, MarginSource::Rule(name));
    }
    Resolved::new(default, MarginSource::Default)
}

impl Pad {
    /// Clearance of the pad's own copper (or hole, for mechanical pads) on
    /// `layer`. Rule values use the constraint minimum.
    #[must_use]
    pub fn own_clearance(&self, layer: PcbLayer, ctx: &ResolveContext<'_>) -> Resolved<f64> {
        let kind = if self.attribute() == PadAttribute::Npth {
            ConstraintKind::HoleClearance
        } else {
            ConstraintKind::Clearance
        };

        resolve(
            self.padstack().copper_layer(layer).clearance,
            self.local_overrides().clearance,
            ctx.footprint.and_then(|f| f.clearance),
            || {
                ctx.evaluate(kind, self, layer)
                    .and_then(|c| c.min.map(|v| (v, c.name)))
            },
            0.0,
        )
    }

    /// Solder mask expansion on `layer`, never below `-min(w, h) / 2` of
    /// the copper on the same side. Zero for pads without copper.
    #[must_use]
    pub fn solder_mask_expansion(
        &self,
        layer: PcbLayer,
        ctx: &ResolveContext<'_>,
    ) -> Resolved<f64> {
        if !self.is_on_copper_layer() {
            return Resolved::new(0.0, MarginSource::Default);
        }

        let mut resolved = resolve(
            self.padstack().mask_layer(layer).solder_mask_margin,
            self.local_overrides().solder_mask_margin,
            ctx.footprint.and_then(|f| f.solder_mask_margin),
            || {
                ctx.evaluate(ConstraintKind::SolderMaskExpansion, self, layer)
                    .and_then(|c| c.opt.map(|v| (v, c.name)))
            },
            0.0,
        );

        let size = self.size(copper_side(layer));
        let floor = -size.x.min(size.y) / 2.0;
        if resolved.value < floor {
            tracing::debug!(
                margin = resolved.value,
                clamped = floor,
                "Clamping solder mask margin"
            );
            resolved.value = floor;
        }
        resolved
    }

    /// Solder paste margin on `layer`: the absolute margin plus the ratio
    /// times the pad size, per axis.
    ///
    /// Each axis is clamped to `-size / 2` except on custom pads, whose
    /// anchor size says nothing about the final outline. Zero for pads
    /// without copper.
    #[must_use]
    pub fn solder_paste_margin(&self, layer: PcbLayer, ctx: &ResolveContext<'_>) -> PasteMargin {
        if !self.is_on_copper_layer() {
            return PasteMargin {
                value: Point::ZERO,
                margin: Resolved::new(0.0, MarginSource::Default),
                ratio: Resolved::new(0.0, MarginSource::Default),
            };
        }

        let mask = self.padstack().mask_layer(layer);
        let local = self.local_overrides();
        let footprint = ctx.footprint;

        let margin = resolve(
            mask.solder_paste_margin,
            local.solder_paste_margin,
            footprint.and_then(|f| f.solder_paste_margin),
            || {
                ctx.evaluate(ConstraintKind::SolderPasteAbsMargin, self, layer)
                    .and_then(|c| c.opt.map(|v| (v, c.name)))
            },
            0.0,
        );
        let ratio = resolve(
            mask.solder_paste_margin_ratio,
            local.solder_paste_margin_ratio,
            footprint.and_then(|f| f.solder_paste_margin_ratio),
            || {
                ctx.evaluate(ConstraintKind::SolderPasteRelMargin, self, layer)
                    .and_then(|c| c.opt.map(|v| (v, c.name)))
            },
            0.0,
        );

        let cu = copper_side(layer);
        let size = self.size(cu);
        let mut value = Point::new(
            ratio.value.mul_add(size.x, margin.value),
            ratio.value.mul_add(size.y, margin.value),
        );

        if self.shape(cu) != PadShape::Custom {
            value.x = value.x.max(-size.x / 2.0);
            value.y = value.y.max(-size.y / 2.0);
        }

        PasteMargin {
            value,
            margin,
            ratio,
        }
    }

    /// Zone connection style on `layer`; thermal relief by default.
    #[must_use]
    pub fn zone_connection(
        &self,
        layer: PcbLayer,
        ctx: &ResolveContext<'_>,
    ) -> Resolved<ZoneConnection> {
        if let Some(v) = self.padstack().copper_layer(layer).zone_connection {
            return Resolved::new(v, MarginSource::PadstackLayer);
        }
        if let Some(v) = self.local_overrides().zone_connection {
            return Resolved::new(v, MarginSource::Pad);
        }
        if let Some(v) = ctx.footprint.and_then(|f| f.zone_connection) {
            return Resolved::new(v, MarginSource::Footprint);
        }
        if let Some(c) = ctx.evaluate(ConstraintKind::ZoneConnection, self, layer) {
            if let Some(v) = c.zone_connection {
                return Resolved::new(v, MarginSource::Rule(c.name));
            }
        }
        Resolved::new(ZoneConnection::Thermal, MarginSource::Default)
    }

    /// Thermal relief gap on `layer`. Rule values use the minimum.
    #[must_use]
    pub fn thermal_gap(&self, layer: PcbLayer, ctx: &ResolveContext<'_>) -> Resolved<f64> {
        resolve(
            self.padstack().copper_layer(layer).thermal_gap,
            self.local_overrides().thermal_gap,
            ctx.footprint.and_then(|f| f.thermal_gap),
            || {
                ctx.evaluate(ConstraintKind::ThermalReliefGap, self, layer)
                    .and_then(|c| c.min.map(|v| (v, c.name)))
            },
            mm_to_iu(DEFAULT_THERMAL_GAP_MM),
        )
    }

    /// Thermal spoke width on `layer`. Rule values use the preferred value.
    #[must_use]
    pub fn thermal_spoke_width(&self, layer: PcbLayer, ctx: &ResolveContext<'_>) -> Resolved<f64> {
        resolve(
            self.padstack().copper_layer(layer).thermal_spoke_width,
            self.local_overrides().thermal_spoke_width,
            ctx.footprint.and_then(|f| f.thermal_spoke_width),
            || {
                ctx.evaluate(ConstraintKind::ThermalSpokeWidth, self, layer)
                    .and_then(|c| c.opt.map(|v| (v, c.name)))
            },
            mm_to_iu(DEFAULT_THERMAL_SPOKE_WIDTH_MM),
        )
    }

    /// Thermal spoke angle on `layer` in degrees.
    #[must_use]
    pub fn thermal_spoke_angle(&self, layer: PcbLayer) -> Resolved<f64> {
        self.padstack()
            .copper_layer(layer)
            .thermal_spoke_angle
            .map_or_else(
                || Resolved::new(self.default_thermal_spoke_angle(layer), MarginSource::Default),
                |v| Resolved::new(v, MarginSource::PadstackLayer),
            )
    }

    /// 45° for round pads (and custom pads with a round anchor), 90°
    /// otherwise.
    #[must_use]
    pub fn default_thermal_spoke_angle(&self, layer: PcbLayer) -> f64 {
        let round = match self.shape(layer) {
            PadShape::Circle => true,
            PadShape::Custom => self.anchor_shape(layer) == PadShape::Circle,
            _ => false,
        };
        if round {
            45.0
        } else {
            90.0
        }
    }
}

/// Copper layer whose size drives the margins of `layer`.
const fn copper_side(layer: PcbLayer) -> PcbLayer {
    if layer.is_back() {
        PcbLayer::BCu
    } else {
        PcbLayer::FCu
    }
}
