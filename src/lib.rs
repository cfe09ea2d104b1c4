//! pcb-padstack: pad and padstack geometry engine for PCB design tools.
//!
//! This library turns declarative pad parameters into 2D geometry on
//! demand and answers the questions a board editor asks of a pad:
//!
//! - **Geometry**: analytic shapes and polygon approximations per copper
//!   layer, biased inside or outside the true outline
//! - **Margins**: clearance, solder mask, solder paste and thermal relief
//!   values resolved through the override chain
//! - **Validation**: manufacturability diagnostics reported to a sink
//! - **Queries**: hit tests, bounding box, per-layer flashing
//!
//! Design rules, board connectivity and footprint defaults are supplied by
//! the caller through the [`board::RuleEvaluator`] and
//! [`board::BoardContext`] traits.
//!
//! # Modules
//!
//! - [`board`] - pads, padstacks, margin resolution, validation
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types
//! - [`geometry`] - points, boxes, shapes and polygon sets

pub mod board;
pub mod config;
pub mod error;
pub mod geometry;
