//! Error types for pad records and layer names.
//!
//! Geometry problems are not errors: they are reported as diagnostics by
//! the validator, and the builders fall back to well-defined shapes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for pad operations.
pub type PadResult<T> = Result<T, PadError>;

/// Errors that can occur while loading, saving or constructing pads.
#[derive(Debug, Error)]
pub enum PadError {
    /// Failed to read a pad record file.
    #[error("Failed to read file: {path}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write a pad record file.
    #[error("Failed to write file: {path}")]
    FileWrite {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A pad record could not be parsed or serialised.
    #[error("Invalid pad record in {path}")]
    Record {
        /// Path to the file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },

    /// Unknown layer name.
    #[error("Unknown layer: {name}")]
    UnknownLayer {
        /// The name that failed to parse.
        name: String,
    },
}

impl PadError {
    /// Creates a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a record parse error.
    pub fn record(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Record {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown layer error.
    pub fn unknown_layer(name: impl Into<String>) -> Self {
        Self::UnknownLayer { name: name.into() }
    }
}
