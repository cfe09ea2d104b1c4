//! Pads and padstacks.
//!
//! A pad is a copper feature of a footprint. Its geometry is described per
//! layer by a [`Padstack`]; everything else is derived from it on demand:
//!
//! - effective analytic shapes per copper layer plus the hole
//! - polygon approximations, biased inside or outside the true outline
//! - bounding box and bounding radius
//! - resolved clearance, mask, paste and thermal margins
//! - validation diagnostics
//! - hit tests and per-layer flashing decisions
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │   Padstack   │───▶│     Pad      │───▶│   ShapeBuilder   │
//! │ (per-layer   │    │ (identity,   │    │ (shapes, polygons│
//! │  records)    │    │  caches)     │    │  per layer)      │
//! └──────────────┘    └──────┬───────┘    └──────────────────┘
//!                            │
//!          ┌─────────────────┼──────────────────┐
//!          ▼                 ▼                  ▼
//!   ┌────────────┐    ┌────────────┐    ┌──────────────┐
//!   │  margins   │    │  validate  │    │   hit_test   │
//!   └────────────┘    └────────────┘    └──────────────┘
//! ```
//!
//! Derived geometry is built lazily and shared through `Arc`, so concurrent
//! readers of an unchanged pad see the same build. Any geometric mutation
//! goes through `&mut Pad` and drops the caches.

pub mod cache;
pub mod error;
pub mod hit_test;
pub mod layer;
pub mod margins;
pub mod pad;
pub mod padstack;
pub mod primitive;
pub mod record;
pub mod shape_builder;
pub mod validate;

pub use cache::{LazyCache, ZoneLayerOverride};
pub use error::{PadError, PadResult};
pub use hit_test::ViewLayer;
pub use layer::{BoardContext, LayerSet, PcbLayer, StaticBoard};
pub use margins::{
    Constraint, ConstraintKind, FootprintDefaults, MarginSource, PasteMargin, ResolveContext,
    Resolved, RuleEvaluator,
};
pub use pad::{LocalOverrides, Pad, PadAttribute, PadProperty};
pub use padstack::{
    ChamferPositions, CustomShapeZoneMode, DrillProps, DrillShape, PadShape, Padstack,
    PadstackMode, UnconnectedLayerMode, ZoneConnection,
};
pub use primitive::Primitive;
pub use record::PadRecord;
pub use shape_builder::{EffectiveShapes, GeometrySettings, LayerPolygons};
pub use validate::{Diagnostic, DiagnosticCode, DiagnosticSink, ValidationSettings};
