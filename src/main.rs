//! padstack-inspect: prints the derived geometry of a pad record.
//!
//! Loads a pad record (JSON), builds its effective shapes and polygons for
//! every distinct layer, resolves its margins and runs the validator.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use pcb_padstack::board::{
    Diagnostic, Pad, PadRecord, PcbLayer, ResolveContext, StaticBoard,
};
use pcb_padstack::config::{self, Config};
use pcb_padstack::geometry::{iu_to_mm, BoundingBox, ErrorLoc};

/// Prints the derived geometry, margins and diagnostics of a pad.
#[derive(Parser, Debug)]
#[command(name = "padstack-inspect")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pad record
    #[arg(value_name = "PAD_FILE")]
    pad: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Only report this layer (for example F.Cu or In2.Cu)
    #[arg(short, long, value_parser = parse_layer)]
    layer: Option<PcbLayer>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

fn parse_layer(s: &str) -> Result<PcbLayer, String> {
    PcbLayer::parse(s).ok_or_else(|| format!("unknown layer '{s}'"))
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration, falling back to defaults when no file exists.
fn load_config(args: &Args) -> Result<Config, ExitCode> {
    match config::load_config(args.config.as_deref()) {
        Ok(cfg) => Ok(cfg),
        Err(e) if e.is_not_found() && args.config.is_none() => Ok(Config::default()),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            Err(ExitCode::FAILURE)
        }
    }
}

fn format_box(bbox: &BoundingBox) -> String {
    if bbox.is_empty() {
        return "empty".to_string();
    }
    format!(
        "({:.4}, {:.4}) .. ({:.4}, {:.4}) mm",
        iu_to_mm(bbox.min_x),
        iu_to_mm(bbox.min_y),
        iu_to_mm(bbox.max_x),
        iu_to_mm(bbox.max_y)
    )
}

/// Prints the geometry of one copper layer.
fn print_layer_geometry(pad: &Pad, layer: PcbLayer) {
    let shape = pad.effective_shape(layer);
    let kinds: Vec<&str> = shape.shapes().iter().map(|s| s.kind_name()).collect();
    let outside = pad.effective_polygon(layer, ErrorLoc::Outside);
    let inside = pad.effective_polygon(layer, ErrorLoc::Inside);

    println!("{layer}:");
    println!("  shape:    {:?} [{}]", pad.shape(layer), kinds.join(", "));
    println!("  bbox:     {}", format_box(&shape.bbox()));
    println!(
        "  polygon:  {} vertices outside, {} inside, area {:.6} mm²",
        outside.total_vertices(),
        inside.total_vertices(),
        iu_to_mm(iu_to_mm(outside.area()))
    );
}

/// Prints the resolved margins of one copper layer.
fn print_layer_margins(pad: &Pad, layer: PcbLayer, ctx: &ResolveContext<'_>) {
    let clearance = pad.own_clearance(layer, ctx);
    let connection = pad.zone_connection(layer, ctx);
    let gap = pad.thermal_gap(layer, ctx);
    let spoke = pad.thermal_spoke_width(layer, ctx);
    let angle = pad.thermal_spoke_angle(layer);

    println!(
        "  clearance {:.4} mm ({})",
        iu_to_mm(clearance.value),
        clearance.source
    );
    println!("  zone     {:?} ({})", connection.value, connection.source);
    println!(
        "  thermal  gap {:.4} mm ({}), spoke {:.4} mm ({}), angle {}°",
        iu_to_mm(gap.value),
        gap.source,
        iu_to_mm(spoke.value),
        spoke.source,
        angle.value
    );
}

/// Prints mask and paste margins for every tech layer the pad is on.
fn print_tech_margins(pad: &Pad, ctx: &ResolveContext<'_>) {
    for (mask, paste) in [
        (PcbLayer::FMask, PcbLayer::FPaste),
        (PcbLayer::BMask, PcbLayer::BPaste),
    ] {
        if pad.is_on_layer(mask) {
            let margin = pad.solder_mask_expansion(mask, ctx);
            println!(
                "{mask}: expansion {:.4} mm ({})",
                iu_to_mm(margin.value),
                margin.source
            );
        }
        if pad.is_on_layer(paste) {
            let margin = pad.solder_paste_margin(paste, ctx);
            println!(
                "{paste}: margin {:.4} x {:.4} mm (abs {}, ratio {})",
                iu_to_mm(margin.value.x),
                iu_to_mm(margin.value.y),
                margin.margin.source,
                margin.ratio.source
            );
        }
    }
}

/// Entry point for padstack-inspect.
fn main() -> ExitCode {
    let args = Args::parse();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(code) => return code,
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    if !args.quiet {
        eprintln!(
            "padstack-inspect {}  Copyright (C) 2026  The Embedded Society",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
        eprintln!("This is free software, licensed under GPL-3.0-or-later.");
        eprintln!();
    }

    let record = match PadRecord::load(&args.pad) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(source) = std::error::Error::source(&e) {
                eprintln!("  caused by: {source}");
            }
            return ExitCode::FAILURE;
        }
    };

    let board = StaticBoard::new(cfg.geometry.copper_layer_count);
    let mut pad = record.into_pad();
    pad.set_geometry_settings(cfg.geometry.to_settings());
    pad.attach_board(&board);

    info!(
        pad = %args.pad.display(),
        number = pad.number(),
        attribute = pad.attribute().as_str(),
        "Inspecting pad"
    );

    let layers: Vec<PcbLayer> = match args.layer {
        Some(layer) => vec![layer],
        None => pad.padstack().unique_layers(),
    };

    println!(
        "pad {} ({}, {:?} padstack)",
        if pad.number().is_empty() { "<unnamed>" } else { pad.number() },
        pad.attribute().as_str(),
        pad.padstack_mode()
    );
    println!("bbox:            {}", format_box(&pad.bounding_box()));
    println!(
        "bounding radius: {:.4} mm",
        iu_to_mm(pad.bounding_radius())
    );
    if let Some(hole) = pad.effective_hole_shape() {
        println!("hole:            {}", format_box(&hole.bbox()));
    }
    println!();

    let ctx = ResolveContext::new();
    for layer in &layers {
        print_layer_geometry(&pad, *layer);
        if layer.is_copper() {
            print_layer_margins(&pad, *layer, &ctx);
            println!(
                "  flashed  {}",
                pad.flash_layer(*layer, Some(&board), false)
            );
        }
    }
    println!();
    print_tech_margins(&pad, &ctx);

    let diagnostics: Vec<Diagnostic> = pad.diagnostics(&cfg.validation.to_settings());
    let fatal = diagnostics.iter().any(|d| d.code.is_fatal());
    if diagnostics.is_empty() {
        println!("\nno diagnostics");
    } else {
        println!("\n{} diagnostic(s):", diagnostics.len());
        for diagnostic in &diagnostics {
            println!("  {diagnostic}");
        }
    }

    if fatal {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_flags() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
        assert_eq!(get_log_level(2, false, "warn"), Level::DEBUG);
    }

    #[test]
    fn layer_argument() {
        assert_eq!(parse_layer("B.Cu"), Ok(PcbLayer::BCu));
        assert!(parse_layer("Top").is_err());
    }
}
