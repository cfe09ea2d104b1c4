//! Pad records.
//!
//! A [`PadRecord`] is the serialisable form of a pad: identity, placement,
//! attribute, overrides and the full padstack, with nothing derived. Loading
//! a record never applies the side effects of [`Pad::set_attribute`]; the
//! padstack comes back exactly as written.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{PadError, PadResult};
use super::pad::{LocalOverrides, Pad, PadAttribute, PadProperty};
use super::padstack::Padstack;
use crate::geometry::Point;

/// Serialisable pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PadRecord {
    /// Stable identity; a fresh one is generated when missing.
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    /// Pad number.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub number: String,
    /// Net code.
    #[serde(default)]
    pub net_code: i32,
    /// Position.
    #[serde(default)]
    pub position: Point,
    /// Attribute.
    pub attribute: PadAttribute,
    /// Fabrication property.
    #[serde(default)]
    pub property: PadProperty,
    /// Pad-level margin overrides.
    #[serde(default)]
    pub local: LocalOverrides,
    /// Per-layer geometry.
    pub padstack: Padstack,
}

impl PadRecord {
    /// Captures `pad`.
    #[must_use]
    pub fn from_pad(pad: &Pad) -> Self {
        Self {
            uuid: pad.uuid(),
            number: pad.number().to_string(),
            net_code: pad.net_code(),
            position: pad.position(),
            attribute: pad.attribute(),
            property: pad.property(),
            local: *pad.local_overrides(),
            padstack: pad.padstack().clone(),
        }
    }

    /// Builds the pad. Geometry caches start empty.
    #[must_use]
    pub fn into_pad(self) -> Pad {
        let mut pad = Pad::with_padstack(self.attribute, self.padstack);
        pad.set_uuid(self.uuid);
        pad.set_number(self.number);
        pad.set_net_code(self.net_code);
        pad.set_position(self.position);
        pad.set_property(self.property);
        *pad.local_overrides_mut() = self.local;
        pad
    }

    /// Parses a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid record.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialises the record as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Loads a record from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid record.
    pub fn load(path: impl AsRef<Path>) -> PadResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PadError::file_read(path, e))?;
        let record = Self::from_json(&text).map_err(|e| PadError::record(path, e))?;
        tracing::debug!(path = %path.display(), uuid = %record.uuid, "Loaded pad record");
        Ok(record)
    }

    /// Writes the record to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> PadResult<()> {
        let path = path.as_ref();
        let text = self.to_json().map_err(|e| PadError::record(path, e))?;
        std::fs::write(path, text).map_err(|e| PadError::file_write(path, e))
    }
}

impl From<&Pad> for PadRecord {
    fn from(pad: &Pad) -> Self {
        Self::from_pad(pad)
    }
}
