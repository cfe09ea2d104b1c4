//! Pad record files and configuration loading.

use pcb_padstack::board::{
    PadError, PadRecord, PadShape, PadstackMode, PcbLayer, Primitive, ValidationSettings,
};
use pcb_padstack::config::{load_config, Config};
use pcb_padstack::error::ConfigError;
use pcb_padstack::geometry::{mm_to_iu, ErrorLoc, Point};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

// =============================================================================
// Pad records
// =============================================================================

const THERMAL_PAD: &str = r#"{
    "uuid": "6f1c2b2e-6a51-4b8e-9a43-1f0b52a9e8d1",
    "number": "EP",
    "net_code": 1,
    "position": { "x": 0.0, "y": 0.0 },
    "attribute": "smd",
    "property": "heatsink",
    "local": { "solder_paste_margin_ratio": -0.2 },
    "padstack": {
        "mode": "normal",
        "orientation": 90.0,
        "layer_set": ["F.Cu", "F.Mask", "F.Paste"],
        "front_copper": {
            "shape": "roundrect",
            "size": { "x": 3000000.0, "y": 2000000.0 },
            "round_rect_ratio": 0.1
        },
        "drill": { "size": { "x": 0.0, "y": 0.0 } }
    }
}"#;

#[test]
fn load_record_and_build_geometry() {
    let dir = temp_dir();
    let path = dir.path().join("ep.json");
    std::fs::write(&path, THERMAL_PAD).unwrap();

    let pad = PadRecord::load(&path).unwrap().into_pad();
    assert_eq!(pad.number(), "EP");
    assert_eq!(pad.padstack_mode(), PadstackMode::Normal);
    assert!(pad.is_geometry_dirty());

    // Rotated by 90°, so the bounding box is taller than wide.
    let bbox = pad.bounding_box();
    assert!((bbox.width() - mm_to_iu(2.0)).abs() < 3.0);
    assert!((bbox.height() - mm_to_iu(3.0)).abs() < 3.0);
    assert!(pad.diagnostics(&ValidationSettings::default()).is_empty());
}

#[test]
fn saved_record_reloads_identically() {
    let dir = temp_dir();
    let path = dir.path().join("custom.json");

    let mut pad = pcb_padstack::board::Pad::smd(
        PadShape::Custom,
        Point::new(mm_to_iu(0.5), mm_to_iu(0.5)),
    );
    pad.add_primitive(
        PcbLayer::FCu,
        Primitive::filled_rect(Point::ZERO, Point::new(mm_to_iu(2.0), mm_to_iu(0.5))),
    );
    let outline = pad.effective_polygon(PcbLayer::FCu, ErrorLoc::Inside);

    PadRecord::from_pad(&pad).save(&path).unwrap();
    let reloaded = PadRecord::load(&path).unwrap().into_pad();

    assert_eq!(reloaded.uuid(), pad.uuid());
    let again = reloaded.effective_polygon(PcbLayer::FCu, ErrorLoc::Inside);
    assert!((again.area() - outline.area()).abs() < 1.0);
}

#[test]
fn record_errors_name_the_file() {
    let dir = temp_dir();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "attribute": "smd" }"#).unwrap();

    match PadRecord::load(&path) {
        Err(PadError::Record { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a record error, got {other:?}"),
    }

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        PadRecord::load(&missing),
        Err(PadError::FileRead { .. })
    ));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn config_file_drives_settings() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "_comment": "fine approximation",
            "geometry": { "max_error_nm": 1000.0, "copper_layer_count": 6 },
            "validation": { "min_drill_size_nm": 50000.0 }
        }"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    let settings = config.geometry.to_settings();
    assert!((settings.max_error - 1000.0).abs() < f64::EPSILON);
    assert_eq!(config.geometry.copper_layer_count, 6);
    assert_eq!(config.logging.level, "warn");

    // A finer approximation produces more vertices.
    let mut coarse = pcb_padstack::board::Pad::smd(
        PadShape::Circle,
        Point::new(mm_to_iu(5.0), mm_to_iu(5.0)),
    );
    let mut fine = coarse.clone();
    fine.set_geometry_settings(settings);
    coarse.set_geometry_settings(Config::default().geometry.to_settings());
    assert!(
        fine.effective_polygon(PcbLayer::FCu, ErrorLoc::Inside).total_vertices()
            > coarse.effective_polygon(PcbLayer::FCu, ErrorLoc::Inside).total_vertices()
    );
}

#[test]
fn config_errors() {
    let dir = temp_dir();

    let missing = dir.path().join("nope.json");
    assert!(matches!(
        load_config(Some(&missing)),
        Err(ConfigError::NotFound { .. })
    ));

    let malformed = dir.path().join("malformed.json");
    std::fs::write(&malformed, "{ geometry: }").unwrap();
    assert!(matches!(
        load_config(Some(&malformed)),
        Err(ConfigError::ParseError { .. })
    ));

    let invalid = dir.path().join("invalid.json");
    std::fs::write(&invalid, r#"{ "geometry": { "min_segments_per_circle": 2 } }"#).unwrap();
    assert!(matches!(
        load_config(Some(&invalid)),
        Err(ConfigError::ValidationError { .. })
    ));
}
