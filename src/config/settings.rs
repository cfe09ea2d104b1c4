//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::board::layer::MAX_COPPER_LAYERS;
use crate::board::shape_builder::{GeometrySettings, DEFAULT_MAX_ERROR};
use crate::board::validate::{ValidationSettings, DEFAULT_MIN_DRILL_SIZE};
use crate::error::ConfigError;
use crate::geometry::polygon::DEFAULT_MIN_SEGMENTS_PER_CIRCLE;

/// Fewest segments a full circle may be approximated with.
const MIN_SEGMENTS_PER_CIRCLE: usize = 8;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Curve approximation and board settings.
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Validator settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let geometry = &self.geometry;
        if geometry.max_error_nm.is_nan() || geometry.max_error_nm <= 0.0 {
            return Err(ConfigError::validation(format!(
                "geometry.max_error_nm must be positive, got {}",
                geometry.max_error_nm
            )));
        }
        if geometry.min_segments_per_circle < MIN_SEGMENTS_PER_CIRCLE {
            return Err(ConfigError::validation(format!(
                "geometry.min_segments_per_circle must be at least {MIN_SEGMENTS_PER_CIRCLE}, got {}",
                geometry.min_segments_per_circle
            )));
        }
        let layers = geometry.copper_layer_count;
        if layers % 2 != 0 || !(2..=MAX_COPPER_LAYERS).contains(&layers) {
            return Err(ConfigError::validation(format!(
                "geometry.copper_layer_count must be an even number in 2..={MAX_COPPER_LAYERS}, got {layers}"
            )));
        }
        if self.validation.min_drill_size_nm < 0.0 {
            return Err(ConfigError::validation(
                "validation.min_drill_size_nm must not be negative",
            ));
        }
        Ok(())
    }
}

/// Curve approximation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryConfig {
    /// Maximum chord deviation from true arcs, in nanometres.
    #[serde(default = "default_max_error")]
    pub max_error_nm: f64,

    /// Minimum segment count for full circles.
    #[serde(default = "default_min_segments")]
    pub min_segments_per_circle: usize,

    /// Copper layers of the board pads are attached to.
    #[serde(default = "default_copper_layer_count")]
    pub copper_layer_count: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            max_error_nm: default_max_error(),
            min_segments_per_circle: default_min_segments(),
            copper_layer_count: default_copper_layer_count(),
        }
    }
}

impl GeometryConfig {
    /// Geometry settings for pads.
    #[must_use]
    pub const fn to_settings(&self) -> GeometrySettings {
        GeometrySettings {
            max_error: self.max_error_nm,
            min_segments_per_circle: self.min_segments_per_circle,
        }
    }
}

const fn default_max_error() -> f64 {
    DEFAULT_MAX_ERROR
}

const fn default_min_segments() -> usize {
    DEFAULT_MIN_SEGMENTS_PER_CIRCLE
}

const fn default_copper_layer_count() -> usize {
    2
}

/// Validator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Drill dimensions at or below this are reported, in nanometres.
    #[serde(default = "default_min_drill_size")]
    pub min_drill_size_nm: f64,

    /// Run the checks meant for the pad properties editor.
    #[serde(default)]
    pub for_pad_properties: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_drill_size_nm: default_min_drill_size(),
            for_pad_properties: false,
        }
    }
}

impl ValidationConfig {
    /// Settings for [`crate::board::Pad::check`].
    #[must_use]
    pub const fn to_settings(&self) -> ValidationSettings {
        ValidationSettings {
            min_drill_size: self.min_drill_size_nm,
            for_pad_properties: self.for_pad_properties,
        }
    }
}

const fn default_min_drill_size() -> f64 {
    DEFAULT_MIN_DRILL_SIZE
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "geometry": {
                "max_error_nm": 2500.0,
                "min_segments_per_circle": 32,
                "copper_layer_count": 4
            },
            "validation": {
                "min_drill_size_nm": 100.0,
                "for_pad_properties": true
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert!((config.geometry.max_error_nm - 2500.0).abs() < f64::EPSILON);
        assert_eq!(config.geometry.min_segments_per_circle, 32);
        assert_eq!(config.geometry.copper_layer_count, 4);
        assert!((config.validation.min_drill_size_nm - 100.0).abs() < f64::EPSILON);
        assert!(config.validation.for_pad_properties);
        assert_eq!(config.logging.level, "debug");

        let settings = config.geometry.to_settings();
        assert_eq!(settings.min_segments_per_circle, 32);
        assert!(config.validation.to_settings().for_pad_properties);
    }

    #[test]
    fn geometry_config_defaults() {
        let config = GeometryConfig::default();
        assert!((config.max_error_nm - 5000.0).abs() < f64::EPSILON);
        assert_eq!(config.min_segments_per_circle, DEFAULT_MIN_SEGMENTS_PER_CIRCLE);
        assert_eq!(config.copper_layer_count, 2);
        assert_eq!(config.to_settings(), GeometrySettings::default());
    }

    #[test]
    fn validation_config_defaults() {
        let config = ValidationConfig::default();
        assert_eq!(config.to_settings(), ValidationSettings::default());
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_out_of_range_geometry() {
        for json in [
            r#"{ "geometry": { "max_error_nm": 0.0 } }"#,
            r#"{ "geometry": { "min_segments_per_circle": 4 } }"#,
            r#"{ "geometry": { "copper_layer_count": 5 } }"#,
            r#"{ "geometry": { "copper_layer_count": 34 } }"#,
            r#"{ "validation": { "min_drill_size_nm": -1.0 } }"#,
        ] {
            let config: Config = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "{json}");
        }
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let nested = r#"{ "geometry": { "arc_error": 1.0 } }"#;
        assert!(serde_json::from_str::<Config>(nested).is_err());
    }
}
