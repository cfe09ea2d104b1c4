//! Hit testing, flashing and view queries.

use super::cache::ZoneLayerOverride;
use super::layer::{BoardContext, PcbLayer};
use super::pad::{Pad, PadAttribute};
use super::padstack::{DrillShape, PadShape, UnconnectedLayerMode};
use crate::geometry::shape::point_in_ring;
use crate::geometry::{mm_to_iu, BoundingBox, ErrorLoc, Point, PolygonSet};

/// Level of detail at which an item is always drawn.
pub const LOD_SHOW: f64 = 0.0;

/// Level of detail at which an item is never drawn.
pub const LOD_HIDE: f64 = f64::MAX;

/// Net names are drawn once the smaller pad side reaches this on screen.
const NETNAME_LOD_THRESHOLD_MM: f64 = 5.0;

/// Layers a pad draws itself on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewLayer {
    /// A board layer.
    Board(PcbLayer),
    /// Plated hole fill.
    PlatedHoles,
    /// Plated hole walls.
    HoleWalls,
    /// Non-plated hole fill.
    NonPlatedHoles,
    /// Net name drawn over one copper layer.
    NetName(PcbLayer),
    /// Net name drawn over the hole of a through-hole pad.
    PadNetNames,
}

impl ViewLayer {
    /// Returns true for net name layers.
    #[must_use]
    pub const fn is_net_name(&self) -> bool {
        matches!(self, Self::NetName(_) | Self::PadNetNames)
    }
}

/// Technical layers a pad can be drawn on, in drawing order.
const TECH_VIEW_LAYERS: [PcbLayer; 6] = [
    PcbLayer::FMask,
    PcbLayer::BMask,
    PcbLayer::FPaste,
    PcbLayer::BPaste,
    PcbLayer::FSilkS,
    PcbLayer::BSilkS,
];

impl Pad {
    /// Returns true when `p` is within `accuracy` of the pad.
    ///
    /// With a layer, only that layer's outline and the hole count, and a
    /// pad not on the layer never hits.
    #[must_use]
    pub fn hit_test_point(&self, p: Point, accuracy: f64, layer: Option<PcbLayer>) -> bool {
        let reach = self.bounding_radius() + accuracy;
        if (p - self.position()).norm_squared() > reach * reach {
            return false;
        }

        let on_outline = match layer {
            Some(layer) => {
                if !self.is_on_layer(layer) {
                    return false;
                }
                self.effective_polygon(layer, ErrorLoc::Inside)
                    .contains(p, accuracy)
            }
            None => self
                .padstack()
                .unique_layers()
                .into_iter()
                .any(|l| self.effective_polygon(l, ErrorLoc::Inside).contains(p, accuracy)),
        };

        on_outline
            || self
                .effective_hole_shape()
                .is_some_and(|hole| hole.collide_point(p, accuracy))
    }

    /// Rectangle hit test.
    ///
    /// With `contained`, the whole pad must lie inside the rectangle grown
    /// by `accuracy`. Otherwise any outline vertex inside it or any outline
    /// edge crossing it is a hit, with the hole tested last.
    #[must_use]
    pub fn hit_test_rect(&self, rect: &BoundingBox, contained: bool, accuracy: f64) -> bool {
        let area = rect.inflated(accuracy);
        let bbox = self.bounding_box();

        if contained {
            return area.contains_box(&bbox);
        }
        if !area.intersects(&bbox) {
            return false;
        }
        if area.contains_box(&bbox) {
            return true;
        }

        let outline_hit = self.padstack().unique_layers().into_iter().any(|layer| {
            self.effective_polygon(layer, ErrorLoc::Inside)
                .rings()
                .iter()
                .any(|ring| {
                    ring.iter().enumerate().any(|(i, &v)| {
                        let next = ring[(i + 1) % ring.len()];
                        area.contains_point(v) || area.intersects_segment(v, next)
                    })
                })
        });

        outline_hit
            || self
                .effective_hole_shape()
                .is_some_and(|hole| hole.collide_rect(&area))
    }

    /// Polygon selection test against a closed `outline`.
    ///
    /// With `contained`, every bounding box corner must be inside the
    /// outline. Otherwise the outline must overlap some layer's outline.
    #[must_use]
    pub fn hit_test_polygon(&self, outline: &[Point], contained: bool) -> bool {
        if outline.len() < 3 {
            return false;
        }

        if contained {
            return self
                .bounding_box()
                .corners()
                .iter()
                .all(|&c| point_in_ring(c, outline));
        }

        let selection = PolygonSet::from_outline(outline);
        self.padstack().unique_layers().into_iter().any(|layer| {
            !self
                .effective_polygon(layer, ErrorLoc::Inside)
                .intersection(&selection)
                .is_empty()
        })
    }

    /// Returns true when the pad actually has copper (or its opening) on
    /// `layer`.
    ///
    /// Non-plated holes that swallow their pad flash nothing on copper.
    /// Technical layers follow the outer copper of their side. Plated
    /// through-hole pads follow the unconnected layer policy; when that
    /// depends on connectivity the board decides, after the zone layer
    /// overrides. `only_check_if_permitted` skips the connectivity query.
    #[must_use]
    pub fn flash_layer(
        &self,
        layer: PcbLayer,
        board: Option<&dyn BoardContext>,
        only_check_if_permitted: bool,
    ) -> bool {
        if !self.is_on_layer(layer) {
            return false;
        }

        if self.attribute() == PadAttribute::Npth && layer.is_copper() && self.hole_swallows(layer)
        {
            return false;
        }

        let layer = if layer.is_front_tech() {
            PcbLayer::FCu
        } else if layer.is_back_tech() {
            PcbLayer::BCu
        } else {
            layer
        };

        if self.attribute() != PadAttribute::Pth || !layer.is_copper() {
            return true;
        }

        let drill = self.padstack().drill();
        match self.unconnected_layer_mode() {
            UnconnectedLayerMode::KeepAll => return true,
            UnconnectedLayerMode::StartEndOnly => {
                return layer == drill.start_layer() || layer == drill.end_layer();
            }
            UnconnectedLayerMode::RemoveExceptStartAndEnd if layer.is_external_copper() => {
                return true;
            }
            UnconnectedLayerMode::RemoveExceptStartAndEnd | UnconnectedLayerMode::RemoveAll => {}
        }

        let Some(board) = board else {
            return true;
        };

        match self.zone_layer_override(layer) {
            ZoneLayerOverride::ForceFlashed => true,
            _ if only_check_if_permitted => true,
            ZoneLayerOverride::ForceUnflashed => false,
            ZoneLayerOverride::None => board.is_connected_on_layer(self, layer),
        }
    }

    /// A centred hole at least as large as the pad on `layer`.
    fn hole_swallows(&self, layer: PcbLayer) -> bool {
        let drill = self.padstack().drill();
        let props = self.padstack().shape_props(layer);
        if props.offset != Point::ZERO {
            return false;
        }
        match (props.shape, drill.shape) {
            (PadShape::Circle, DrillShape::Circle) => drill.size.x >= props.size.x,
            (PadShape::Oval, DrillShape::Oblong) => {
                drill.size.x >= props.size.x && drill.size.y >= props.size.y
            }
            _ => false,
        }
    }

    /// Layers the pad draws on, restricted to the board's enabled layers
    /// when a board is given.
    #[must_use]
    pub fn view_layers(&self, board: Option<&dyn BoardContext>) -> Vec<ViewLayer> {
        let mut layers = Vec::new();

        match self.attribute() {
            PadAttribute::Pth => {
                layers.push(ViewLayer::PlatedHoles);
                layers.push(ViewLayer::HoleWalls);
            }
            PadAttribute::Npth => layers.push(ViewLayer::NonPlatedHoles),
            PadAttribute::Smd | PadAttribute::Conn => {}
        }

        let mut copper = self.layer_set().copper();
        if let Some(board) = board {
            copper = copper.intersection(board.enabled_layers());
        }

        if copper.len() > 1 {
            for layer in copper.iter() {
                layers.push(ViewLayer::Board(layer));
                layers.push(ViewLayer::NetName(layer));
            }
            layers.push(ViewLayer::PadNetNames);
        } else if let Some(layer) = copper.first() {
            layers.push(ViewLayer::Board(layer));
            if self.attribute() == PadAttribute::Pth {
                layers.push(ViewLayer::PadNetNames);
            } else {
                layers.push(ViewLayer::NetName(layer));
            }
        }

        layers.extend(
            TECH_VIEW_LAYERS
                .into_iter()
                .filter(|l| self.is_on_layer(*l))
                .map(ViewLayer::Board),
        );
        layers
    }

    /// Zoom level below which `layer` is not drawn.
    ///
    /// Net names hide on zero-size pads and otherwise appear once the
    /// smaller bounding box side is large enough on screen.
    #[must_use]
    pub fn view_lod(&self, layer: ViewLayer) -> f64 {
        if !layer.is_net_name() {
            return LOD_SHOW;
        }

        let size = self.size(self.principal_layer());
        if size.x.min(size.y) <= 0.0 {
            return LOD_HIDE;
        }

        let min_side = self.bounding_box().min_side();
        if min_side <= 0.0 {
            return LOD_HIDE;
        }
        mm_to_iu(NETNAME_LOD_THRESHOLD_MM) / min_side
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::layer::StaticBoard;
    use crate::geometry::mils_to_iu;

    #[test]
    fn point_hits_copper_and_hole() {
        let pad = Pad::new();
        let r = mils_to_iu(30.0);
        assert!(pad.hit_test_point(Point::ZERO, 0.0, None));
        assert!(pad.hit_test_point(Point::new(r * 0.9, 0.0), 0.0, None));
        assert!(!pad.hit_test_point(Point::new(r * 1.5, 0.0), 0.0, None));
        assert!(pad.hit_test_point(Point::new(r * 1.5, 0.0), r, None));
    }

    #[test]
    fn point_on_missing_layer_misses() {
        let pad = Pad::smd(PadShape::Rect, Point::new(1.0e6, 1.0e6));
        assert!(pad.hit_test_point(Point::ZERO, 0.0, Some(PcbLayer::FCu)));
        assert!(!pad.hit_test_point(Point::ZERO, 0.0, Some(PcbLayer::BCu)));
    }

    #[test]
    fn rect_hits() {
        let pad = Pad::smd(PadShape::Rect, Point::new(2.0e6, 2.0e6));
        let inside = BoundingBox::from_corners(Point::new(-0.1e6, -0.1e6), Point::new(0.1e6, 0.1e6));
        let crossing = BoundingBox::from_corners(Point::new(0.5e6, -3.0e6), Point::new(0.6e6, 3.0e6));
        let corner = BoundingBox::from_corners(Point::new(0.9e6, 0.9e6), Point::new(3.0e6, 3.0e6));
        let away = BoundingBox::from_corners(Point::new(5.0e6, 5.0e6), Point::new(6.0e6, 6.0e6));
        let all = BoundingBox::from_corners(Point::new(-5.0e6, -5.0e6), Point::new(5.0e6, 5.0e6));

        assert!(pad.hit_test_rect(&crossing, false, 0.0));
        assert!(pad.hit_test_rect(&corner, false, 0.0));
        assert!(!pad.hit_test_rect(&away, false, 0.0));
        assert!(pad.hit_test_rect(&all, true, 0.0));
        assert!(!pad.hit_test_rect(&crossing, true, 0.0));
        // A rectangle strictly inside the copper touches no edge or vertex.
        assert!(!pad.hit_test_rect(&inside, false, 0.0));
    }

    #[test]
    fn rect_falls_back_to_hole() {
        let mut pad = Pad::new();
        pad.set_offset(PcbLayer::FCu, Point::new(mils_to_iu(200.0), 0.0));
        let around_hole =
            BoundingBox::from_corners(Point::new(-1.0e5, -1.0e5), Point::new(1.0e5, 1.0e5));
        assert!(pad.hit_test_rect(&around_hole, false, 0.0));
    }

    #[test]
    fn polygon_hits() {
        let pad = Pad::smd(PadShape::Rect, Point::new(2.0e6, 2.0e6));
        let big = [
            Point::new(-5.0e6, -5.0e6),
            Point::new(5.0e6, -5.0e6),
            Point::new(5.0e6, 5.0e6),
            Point::new(-5.0e6, 5.0e6),
        ];
        let sliver = [
            Point::new(0.5e6, -5.0e6),
            Point::new(0.6e6, -5.0e6),
            Point::new(0.6e6, 5.0e6),
        ];
        assert!(pad.hit_test_polygon(&big, true));
        assert!(pad.hit_test_polygon(&sliver, false));
        assert!(!pad.hit_test_polygon(&sliver, true));
        assert!(!pad.hit_test_polygon(&sliver[..2], false));
    }

    #[test]
    fn npth_swallowed_by_hole_does_not_flash_copper() {
        let mut pad = Pad::new();
        pad.set_attribute(PadAttribute::Npth);
        pad.set_drill_size(Point::new(mils_to_iu(60.0), mils_to_iu(60.0)));
        assert!(!pad.flash_layer(PcbLayer::FCu, None, false));
        assert!(pad.flash_layer(PcbLayer::FMask, None, false));
    }

    #[test]
    fn unconnected_layer_policies() {
        let mut pad = Pad::new();
        let board = StaticBoard::new(4).with_connection(PcbLayer::In(2));
        pad.attach_board(&board);

        assert!(pad.flash_layer(PcbLayer::In(1), Some(&board), false));

        pad.set_unconnected_layer_mode(UnconnectedLayerMode::RemoveAll);
        assert!(!pad.flash_layer(PcbLayer::In(1), Some(&board), false));
        assert!(pad.flash_layer(PcbLayer::In(1), Some(&board), true));
        assert!(pad.flash_layer(PcbLayer::In(2), Some(&board), false));
        assert!(!pad.flash_layer(PcbLayer::FCu, Some(&board), false));
        assert!(pad.flash_layer(PcbLayer::In(1), None, false));

        pad.set_unconnected_layer_mode(UnconnectedLayerMode::RemoveExceptStartAndEnd);
        assert!(pad.flash_layer(PcbLayer::FCu, Some(&board), false));
        assert!(pad.flash_layer(PcbLayer::FMask, Some(&board), false));
        assert!(!pad.flash_layer(PcbLayer::In(1), Some(&board), false));

        pad.set_unconnected_layer_mode(UnconnectedLayerMode::StartEndOnly);
        assert!(!pad.flash_layer(PcbLayer::In(2), Some(&board), false));
        assert!(pad.flash_layer(PcbLayer::BCu, Some(&board), false));
    }

    #[test]
    fn zone_overrides_drive_flashing() {
        let mut pad = Pad::new();
        let board = StaticBoard::new(4).with_connection(PcbLayer::In(2));
        pad.set_unconnected_layer_mode(UnconnectedLayerMode::RemoveAll);

        pad.set_zone_layer_override(PcbLayer::In(1), ZoneLayerOverride::ForceFlashed);
        assert!(pad.flash_layer(PcbLayer::In(1), Some(&board), false));

        pad.set_zone_layer_override(PcbLayer::In(2), ZoneLayerOverride::ForceUnflashed);
        assert!(!pad.flash_layer(PcbLayer::In(2), Some(&board), false));
        assert!(pad.flash_layer(PcbLayer::In(2), Some(&board), true));
    }

    #[test]
    fn view_layers_for_pth_and_smd() {
        let pad = Pad::new();
        let board = StaticBoard::new(2);
        let layers = pad.view_layers(Some(&board));
        assert!(layers.contains(&ViewLayer::PlatedHoles));
        assert!(layers.contains(&ViewLayer::Board(PcbLayer::BCu)));
        assert!(!layers.contains(&ViewLayer::Board(PcbLayer::In(1))));
        assert!(layers.contains(&ViewLayer::PadNetNames));
        assert!(layers.contains(&ViewLayer::Board(PcbLayer::FMask)));

        let smd = Pad::smd(PadShape::Rect, Point::new(1.0e6, 1.0e6));
        let layers = smd.view_layers(None);
        assert_eq!(
            layers,
            vec![
                ViewLayer::Board(PcbLayer::FCu),
                ViewLayer::NetName(PcbLayer::FCu),
                ViewLayer::Board(PcbLayer::FMask),
                ViewLayer::Board(PcbLayer::FPaste),
            ]
        );
    }

    #[test]
    fn net_name_lod() {
        let mut pad = Pad::smd(PadShape::Rect, Point::new(1.0e6, 2.0e6));
        let lod = pad.view_lod(ViewLayer::NetName(PcbLayer::FCu));
        assert!(lod > 4.9 && lod < 5.0);
        assert!(pad.view_lod(ViewLayer::Board(PcbLayer::FCu)).abs() < f64::EPSILON);

        pad.set_size(PcbLayer::FCu, Point::new(0.0, 2.0e6));
        assert!((pad.view_lod(ViewLayer::NetName(PcbLayer::FCu)) - LOD_HIDE).abs() < f64::EPSILON);
    }
}
