//! Renderer configuration with TOML file support.
//!
//! Global render toggles, buffer sizing, tessellation and colour settings
//! are consolidated here. Every section uses `#[serde(default)]` so a file
//! overriding a single value is valid.

mod buffers;
mod colours;
mod geometry;
mod render;

use std::path::Path;

pub use buffers::BufferOptions;
pub use colours::ColourOptions;
pub use geometry::{
    GeometryOptions, MAX_ATOM_LOD, MAX_CHAIN_LOD, MIN_ATOM_LOD, MIN_CHAIN_LOD,
};
pub use render::RenderOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::MolpassError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Global render toggles.
    pub render: RenderOptions,
    /// Geometry buffer sizing.
    pub buffers: BufferOptions,
    /// Tessellation and backbone geometry.
    pub geometry: GeometryOptions,
    /// Colour map source and fallback.
    pub colours: ColourOptions,
}

impl Options {
    /// Generate JSON Schema describing the options file.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// JSON Schema as pretty-printed JSON text, for hosts that build
    /// option editors.
    ///
    /// # Errors
    ///
    /// [`MolpassError::OptionsParse`] on serialization failure.
    pub fn schema_json() -> Result<String, MolpassError> {
        serde_json::to_string_pretty(&Self::json_schema())
            .map_err(|e| MolpassError::OptionsParse(e.to_string()))
    }

    /// Copy of these options with `section.field` replaced by `value`.
    ///
    /// # Errors
    ///
    /// [`MolpassError::OptionsParse`] if the section or field does not
    /// exist or `value` has the wrong type for it.
    pub fn with_field(
        &self,
        section: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<Self, MolpassError> {
        let mut root =
            serde_json::to_value(self).map_err(|e| MolpassError::OptionsParse(e.to_string()))?;
        let slot = root
            .get_mut(section)
            .and_then(|s| s.get_mut(field))
            .ok_or_else(|| MolpassError::OptionsParse(format!("no option {section}.{field}")))?;
        *slot = value;
        serde_json::from_value(root).map_err(|e| MolpassError::OptionsParse(e.to_string()))
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`MolpassError::OptionsParse`] if the text is not valid TOML for
    /// these options.
    pub fn from_toml(text: &str) -> Result<Self, MolpassError> {
        toml::from_str(text).map_err(|e| MolpassError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`MolpassError::Io`] if the file cannot be read, or
    /// [`MolpassError::OptionsParse`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, MolpassError> {
        let content = std::fs::read_to_string(path).map_err(MolpassError::Io)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`MolpassError::OptionsParse`] on serialization failure or
    /// [`MolpassError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), MolpassError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MolpassError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(MolpassError::Io)?;
        }
        std::fs::write(path, content).map_err(MolpassError::Io)
    }
}
