//! Pad sanity checks.
//!
//! [`Pad::check`] runs every check and reports through a [`DiagnosticSink`].
//! It never fails and never stops early, so the same pass serves a silent
//! batch run and an interactive property editor.

use std::fmt;

use super::layer::{LayerSet, PcbLayer};
use super::pad::{Pad, PadAttribute, PadProperty};
use super::padstack::{DrillShape, PadShape};
use crate::geometry::{ErrorLoc, PolygonSet};

/// Smallest drill dimension a hole polygon can be built from.
pub const DEFAULT_MIN_DRILL_SIZE: f64 = 4.0;

/// Diagnostic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Structurally broken geometry; downstream geometry for the layer is
    /// meaningless.
    PadstackInvalid,
    /// Unusual but legal geometry.
    Padstack,
    /// Through-hole pad without a hole.
    PadThWithNoHole,
}

impl DiagnosticCode {
    /// Returns the stable textual token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PadstackInvalid => "padstack_invalid",
            Self::Padstack => "padstack",
            Self::PadThWithNoHole => "pad_th_with_no_hole",
        }
    }

    /// Returns true for diagnostics that invalidate the pad geometry.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PadstackInvalid)
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Class.
    pub code: DiagnosticCode,
    /// Human-readable detail, may be empty.
    pub message: String,
    /// Layer record the problem was found on, `None` for pad-wide checks.
    pub layer: Option<PcbLayer>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code.as_str())?;
        if let Some(layer) = self.layer {
            write!(f, " {layer}")?;
        }
        if !self.message.is_empty() {
            write!(f, " {}", self.message)?;
        }
        Ok(())
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    /// Receives one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}

/// Options for [`Pad::check`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationSettings {
    /// Drill dimensions at or below this are rejected.
    pub min_drill_size: f64,
    /// Also run the checks only meaningful while editing a single pad.
    pub for_pad_properties: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_drill_size: DEFAULT_MIN_DRILL_SIZE,
            for_pad_properties: false,
        }
    }
}

struct Reporter<'a, S: DiagnosticSink + ?Sized> {
    sink: &'a mut S,
    layer: Option<PcbLayer>,
}

impl<S: DiagnosticSink + ?Sized> Reporter<'_, S> {
    fn report(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            code,
            message: message.into(),
            layer: self.layer,
        };
        tracing::trace!(%diagnostic, "Pad check");
        self.sink.report(diagnostic);
    }
}

impl Pad {
    /// Runs every check, per unique layer and then pad-wide.
    pub fn check<S: DiagnosticSink + ?Sized>(&self, settings: &ValidationSettings, sink: &mut S) {
        for layer in self.padstack().unique_layers() {
            let mut out = Reporter {
                sink: &mut *sink,
                layer: Some(layer),
            };
            self.check_layer(layer, settings, &mut out);
        }

        let mut out = Reporter { sink, layer: None };
        self.check_pad(&mut out);
    }

    /// Runs [`Pad::check`] and collects the diagnostics.
    #[must_use]
    pub fn diagnostics(&self, settings: &ValidationSettings) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        self.check(settings, &mut |d: Diagnostic| found.push(d));
        found
    }

    #[allow(clippy::too_many_lines)]
    fn check_layer<S: DiagnosticSink + ?Sized>(
        &self,
        layer: PcbLayer,
        settings: &ValidationSettings,
        out: &mut Reporter<'_, S>,
    ) {
        use DiagnosticCode::{Padstack, PadstackInvalid};

        let props = self.padstack().shape_props(layer);
        let shape = props.shape;
        let mut size = props.size;

        if shape == PadShape::Custom {
            let bbox = self.bounding_box();
            size.x = bbox.width();
            size.y = bbox.height();
        } else if size.x <= 0.0 || (size.y <= 0.0 && shape != PadShape::Circle) {
            out.report(PadstackInvalid, "pad must have a positive size");
        }

        let drill = self.padstack().drill();
        if self.is_on_copper_layer() && drill.size.x > 0.0 {
            if drill.size.x <= settings.min_drill_size || drill.size.y <= settings.min_drill_size {
                out.report(
                    PadstackInvalid,
                    format!(
                        "hole size must be larger than {} nm",
                        settings.min_drill_size
                    ),
                );
            }

            let max_error = self.geometry_settings().max_error;
            let pad_outline =
                self.transform_shape_to_polygon(layer, 0.0, max_error, ErrorLoc::Inside);

            if self.attribute() == PadAttribute::Pth {
                let hole_outline = self.transform_hole_to_polygon(0.0, max_error, ErrorLoc::Outside);
                let copper = pad_outline.difference(&hole_outline);
                if copper.is_empty() {
                    out.report(Padstack, "hole leaves no copper");
                } else if settings.for_pad_properties
                    && !hole_outline.difference(&pad_outline).is_empty()
                {
                    out.report(Padstack, "hole not fully inside copper");
                }
            } else if !pad_outline.contains(self.position(), 0.0) {
                out.report(Padstack, "hole not inside pad shape");
            }
        }

        let copper = self.padstack().copper_layer(layer);
        if copper
            .clearance
            .or(self.local_overrides().clearance)
            .is_some_and(|c| c < 0.0)
        {
            out.report(Padstack, "negative local clearance has no effect");
        }

        let mask = self.padstack().mask_layer(layer);
        let mask_margin = mask
            .solder_mask_margin
            .or(self.local_overrides().solder_mask_margin);
        if let Some(margin) = mask_margin.filter(|m| *m < 0.0) {
            let abs_margin = margin.abs();
            if shape == PadShape::Custom {
                let max_error = self.geometry_settings().max_error;
                let too_large = copper.primitives.iter().any(|p| {
                    let b = p.bbox(max_error);
                    abs_margin > b.width() || abs_margin > b.height()
                });
                if too_large {
                    out.report(
                        Padstack,
                        "negative solder mask margin is larger than some primitives",
                    );
                }
            } else if abs_margin > size.x || abs_margin > size.y {
                out.report(
                    Padstack,
                    "negative solder mask margin is larger than the pad; no mask opening",
                );
            }
        }

        let paste_margin = mask
            .solder_paste_margin
            .or(self.local_overrides().solder_paste_margin)
            .unwrap_or(0.0);
        let paste_ratio = mask
            .solder_paste_margin_ratio
            .or(self.local_overrides().solder_paste_margin_ratio)
            .unwrap_or(0.0);
        let paste_x = size.x + paste_margin + size.x * paste_ratio;
        let paste_y = size.y + paste_margin + size.y * paste_ratio;
        if paste_x <= 0.0 || paste_y <= 0.0 {
            out.report(
                Padstack,
                "negative solder paste margin is larger than the pad; no paste opening",
            );
        }

        match shape {
            PadShape::RoundRect => {
                if props.round_rect_ratio < 0.0 {
                    out.report(PadstackInvalid, "negative corner radius");
                } else if props.round_rect_ratio > 0.5 {
                    out.report(PadstackInvalid, "corner radius is too large");
                }
            }
            PadShape::ChamferedRect => {
                if props.chamfer_ratio < 0.0 {
                    out.report(PadstackInvalid, "negative corner chamfer");
                } else if props.chamfer_ratio > 0.5 {
                    out.report(PadstackInvalid, "corner chamfer is too large");
                }
            }
            PadShape::Trapezoid => {
                let delta = props.trapezoid_delta;
                if delta.x.abs() >= props.size.y || delta.y.abs() >= props.size.x {
                    out.report(PadstackInvalid, "trapezoid delta is too large");
                }
            }
            PadShape::Custom => {
                let merged: PolygonSet = self.merge_primitives_as_polygon(layer, ErrorLoc::Inside);
                if merged.outline_count() > 1 {
                    out.report(
                        PadstackInvalid,
                        "custom pad shape must resolve to a single polygon",
                    );
                }
            }
            PadShape::Circle | PadShape::Oval | PadShape::Rect => {}
        }
    }

    fn check_pad<S: DiagnosticSink + ?Sized>(&self, out: &mut Reporter<'_, S>) {
        use DiagnosticCode::{PadThWithNoHole, Padstack, PadstackInvalid};

        let layers = self.layer_set();
        let drill = self.padstack().drill();
        let attribute = self.attribute();
        let has_drill_size = drill.size.x > 0.0 || drill.size.y > 0.0;

        if layers.is_empty() {
            out.report(PadstackInvalid, "pad has no layer");
        }

        if attribute == PadAttribute::Pth && !self.is_on_copper_layer() {
            out.report(Padstack, "PTH pad has no copper layers");
        }

        if !layers.contains(PcbLayer::FCu)
            && !layers.contains(PcbLayer::BCu)
            && has_drill_size
            && attribute != PadAttribute::Npth
        {
            out.report(
                Padstack,
                "plated holes normally have copper on at least one outer layer",
            );
        }

        let property_message = match self.property() {
            PadProperty::FiducialGlobal | PadProperty::FiducialLocal
                if attribute == PadAttribute::Npth =>
            {
                Some("fiducial pads are normally plated")
            }
            PadProperty::Testpoint if attribute == PadAttribute::Npth => {
                Some("testpoint pads are normally plated")
            }
            PadProperty::Heatsink if attribute == PadAttribute::Npth => {
                Some("heatsink pads are normally plated")
            }
            PadProperty::Castellated if attribute != PadAttribute::Pth => {
                Some("castellated property is for PTH pads")
            }
            PadProperty::Bga if attribute != PadAttribute::Smd => {
                Some("BGA property is for SMD pads")
            }
            PadProperty::Mechanical if attribute != PadAttribute::Pth => {
                Some("mechanical property is for PTH pads")
            }
            PadProperty::Pressfit if attribute != PadAttribute::Pth || !self.has_hole() => {
                Some("press-fit property is for PTH pads")
            }
            _ => None,
        };
        if let Some(message) = property_message {
            out.report(Padstack, message);
        }

        match attribute {
            PadAttribute::Pth | PadAttribute::Npth => {
                if drill.size.x <= 0.0
                    || (drill.size.y <= 0.0 && drill.shape == DrillShape::Oblong)
                {
                    out.report(PadThWithNoHole, "");
                }
            }
            PadAttribute::Conn | PadAttribute::Smd => {
                if attribute == PadAttribute::Conn
                    && (layers.contains(PcbLayer::FPaste) || layers.contains(PcbLayer::BPaste))
                {
                    out.report(
                        Padstack,
                        "connector pads normally have no solder paste; use an SMD pad",
                    );
                }

                if has_drill_size {
                    out.report(PadstackInvalid, "SMD pad has a hole");
                }

                let front = layers.contains(PcbLayer::FCu);
                let back = layers.contains(PcbLayer::BCu);
                if front && back {
                    out.report(Padstack, "SMD pad has copper on both sides of the board");
                } else if front {
                    check_opposite_side(out, layers, PcbLayer::BMask, PcbLayer::BPaste);
                } else if back {
                    check_opposite_side(out, layers, PcbLayer::FMask, PcbLayer::FPaste);
                } else if !layers.intersection(LayerSet::internal_copper()).is_empty() {
                    out.report(Padstack, "SMD pad has no outer layers");
                }
            }
        }
    }
}

fn check_opposite_side<S: DiagnosticSink + ?Sized>(
    out: &mut Reporter<'_, S>,
    layers: LayerSet,
    mask: PcbLayer,
    paste: PcbLayer,
) {
    if layers.contains(mask) {
        out.report(
            DiagnosticCode::Padstack,
            "SMD pad has copper and mask layers on different sides of the board",
        );
    } else if layers.contains(paste) {
        out.report(
            DiagnosticCode::Padstack,
            "SMD pad has copper and paste layers on different sides of the board",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::padstack::{ChamferPositions, PadstackMode};
    use crate::board::primitive::Primitive;
    use crate::geometry::{mils_to_iu, Point};

    fn codes(pad: &Pad) -> Vec<DiagnosticCode> {
        pad.diagnostics(&ValidationSettings::default())
            .into_iter()
            .map(|d| d.code)
            .collect()
    }

    fn has_message(pad: &Pad, needle: &str) -> bool {
        pad.diagnostics(&ValidationSettings::default())
            .iter()
            .any(|d| d.message.contains(needle))
    }

    #[test]
    fn default_pad_is_clean() {
        assert!(codes(&Pad::new()).is_empty());
        assert!(codes(&Pad::smd(PadShape::Rect, Point::new(1.0e6, 1.0e6))).is_empty());
    }

    #[test]
    fn closure_sink_receives_everything() {
        let mut pad = Pad::new();
        pad.set_drill_size(Point::ZERO);
        pad.set_size(PcbLayer::FCu, Point::ZERO);
        let mut count = 0;
        pad.check(&ValidationSettings::default(), &mut |_: Diagnostic| count += 1);
        assert!(count >= 2);
    }

    #[test]
    fn through_hole_without_drill() {
        let mut pad = Pad::new();
        pad.set_drill_size(Point::ZERO);
        assert_eq!(codes(&pad), vec![DiagnosticCode::PadThWithNoHole]);
    }

    #[test]
    fn non_positive_size_is_invalid() {
        let mut pad = Pad::smd(PadShape::Rect, Point::new(1.0e6, 0.0));
        assert!(codes(&pad).contains(&DiagnosticCode::PadstackInvalid));
        pad.set_shape(PcbLayer::FCu, PadShape::Circle);
        assert!(!codes(&pad).contains(&DiagnosticCode::PadstackInvalid));
    }

    #[test]
    fn hole_consuming_copper() {
        let mut pad = Pad::new();
        pad.set_drill_size(Point::new(mils_to_iu(80.0), mils_to_iu(80.0)));
        assert!(has_message(&pad, "hole leaves no copper"));
    }

    #[test]
    fn hole_outside_copper_in_properties_mode() {
        let mut pad = Pad::new();
        pad.set_offset(PcbLayer::FCu, Point::new(mils_to_iu(40.0), 0.0));
        let settings = ValidationSettings {
            for_pad_properties: true,
            ..ValidationSettings::default()
        };
        assert!(pad
            .diagnostics(&settings)
            .iter()
            .any(|d| d.message.contains("not fully inside copper")));
        assert!(!has_message(&pad, "not fully inside copper"));
    }

    #[test]
    fn tiny_drill_is_invalid() {
        let mut pad = Pad::new();
        pad.set_drill_size(Point::new(3.0, 3.0));
        assert!(codes(&pad).contains(&DiagnosticCode::PadstackInvalid));
    }

    #[test]
    fn negative_margins() {
        let mut pad = Pad::smd(PadShape::Rect, Point::new(1.0e6, 1.0e6));
        pad.local_overrides_mut().clearance = Some(-1.0);
        pad.local_overrides_mut().solder_mask_margin = Some(-2.0e6);
        pad.local_overrides_mut().solder_paste_margin = Some(-1.0e6);
        assert!(has_message(&pad, "negative local clearance"));
        assert!(has_message(&pad, "no mask opening"));
        assert!(has_message(&pad, "no paste opening"));
        assert!(!codes(&pad).contains(&DiagnosticCode::PadstackInvalid));
    }

    #[test]
    fn raw_ratios_are_reported() {
        let mut pad = Pad::smd(PadShape::ChamferedRect, Point::new(1.0e6, 1.0e6));
        pad.set_chamfer_positions(PcbLayer::FCu, ChamferPositions::all());
        pad.edit_padstack(|ps| ps.shape_props_mut(PcbLayer::FCu).chamfer_ratio = 0.7);
        assert!(has_message(&pad, "chamfer is too large"));

        pad.set_shape(PcbLayer::FCu, PadShape::RoundRect);
        pad.edit_padstack(|ps| ps.shape_props_mut(PcbLayer::FCu).round_rect_ratio = -0.1);
        assert!(codes(&pad).contains(&DiagnosticCode::PadstackInvalid));
    }

    #[test]
    fn oversized_corner_radius_is_invalid() {
        let mut pad = Pad::smd(PadShape::RoundRect, Point::new(2.0e6, 1.0e6));
        pad.edit_padstack(|ps| ps.shape_props_mut(PcbLayer::FCu).round_rect_ratio = 0.7);
        assert!(codes(&pad).contains(&DiagnosticCode::PadstackInvalid));
        assert!(has_message(&pad, "corner radius is too large"));

        // The fallback geometry stays within the declared size.
        let bbox = pad.effective_shape(PcbLayer::FCu).bbox();
        assert!(bbox.width() <= 2.0e6 + 1e-6);
        assert!(bbox.height() <= 1.0e6 + 1e-6);
    }

    #[test]
    fn trapezoid_delta_bounds() {
        let mut pad = Pad::smd(PadShape::Trapezoid, Point::new(2.0e6, 1.0e6));
        pad.set_trapezoid_delta(PcbLayer::FCu, Point::new(0.5e6, 0.0));
        assert!(codes(&pad).is_empty());
        pad.set_trapezoid_delta(PcbLayer::FCu, Point::new(1.5e6, 0.0));
        assert!(has_message(&pad, "trapezoid delta"));
    }

    #[test]
    fn trapezoid_collapsed_to_a_triangle_is_invalid() {
        let mut pad = Pad::smd(PadShape::Trapezoid, Point::new(2.0e6, 1.0e6));
        pad.set_trapezoid_delta(PcbLayer::FCu, Point::new(1.0e6, 0.0));
        assert!(codes(&pad).contains(&DiagnosticCode::PadstackInvalid));

        pad.set_trapezoid_delta(PcbLayer::FCu, Point::new(0.0, -2.0e6));
        assert!(codes(&pad).contains(&DiagnosticCode::PadstackInvalid));

        pad.set_trapezoid_delta(PcbLayer::FCu, Point::new(0.999e6, 0.0));
        assert!(codes(&pad).is_empty());
    }

    #[test]
    fn disjoint_custom_shape_is_invalid() {
        let mut pad = Pad::smd(PadShape::Custom, Point::new(1.0e6, 1.0e6));
        pad.add_primitive(
            PcbLayer::FCu,
            Primitive::filled_circle(Point::new(5.0e6, 0.0), 1.0e6),
        );
        assert!(has_message(&pad, "single polygon"));

        pad.set_primitives(
            PcbLayer::FCu,
            vec![Primitive::filled_circle(Point::new(0.5e6, 0.0), 1.0e6)],
        );
        assert!(!has_message(&pad, "single polygon"));
    }

    #[test]
    fn smd_cross_checks() {
        let mut pad = Pad::smd(PadShape::Rect, Point::new(1.0e6, 1.0e6));
        pad.set_layer_set(
            LayerSet::new()
                .with(PcbLayer::FCu)
                .with(PcbLayer::BCu)
                .with(PcbLayer::FMask),
        );
        assert!(has_message(&pad, "both sides"));

        pad.set_layer_set(LayerSet::new().with(PcbLayer::FCu).with(PcbLayer::BMask));
        assert!(has_message(&pad, "mask layers on different sides"));

        pad.set_layer_set(LayerSet::new().with(PcbLayer::In(2)));
        assert!(has_message(&pad, "no outer layers"));

        pad.set_layer_set(LayerSet::new());
        assert!(has_message(&pad, "no layer"));
    }

    #[test]
    fn connector_with_paste() {
        let mut pad = Pad::smd(PadShape::Rect, Point::new(1.0e6, 1.0e6));
        pad.set_attribute(PadAttribute::Conn);
        assert!(has_message(&pad, "connector pads"));
    }

    #[test]
    fn property_cross_checks() {
        let mut pad = Pad::new();
        pad.set_attribute(PadAttribute::Npth);
        pad.set_property(PadProperty::FiducialLocal);
        assert!(has_message(&pad, "fiducial"));

        let mut smd = Pad::smd(PadShape::Circle, Point::new(1.0e6, 1.0e6));
        smd.set_property(PadProperty::Castellated);
        assert!(has_message(&smd, "castellated"));
        smd.set_property(PadProperty::Bga);
        assert!(codes(&smd).is_empty());
    }

    #[test]
    fn checks_run_per_unique_layer() {
        let mut pad = Pad::new();
        pad.set_padstack_mode(PadstackMode::FrontInnerBack);
        pad.edit_padstack(|ps| ps.shape_props_mut(PcbLayer::BCu).size = Point::ZERO);
        let found = pad.diagnostics(&ValidationSettings::default());
        let invalid: Vec<_> = found
            .iter()
            .filter(|d| d.code == DiagnosticCode::PadstackInvalid)
            .collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].layer, Some(PcbLayer::BCu));
    }
}
