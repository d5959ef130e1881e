use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::colour::{Colour, ColourMap};
use crate::error::MolpassError;

/// Colour map source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ColourOptions {
    /// Colour map file layered over the built-in table.
    pub colour_map: Option<PathBuf>,
    /// Colour for keys the map does not know, as floats in `0.0..=1.0`.
    pub fallback: [f32; 3],
}

impl Default for ColourOptions {
    fn default() -> Self {
        Self {
            colour_map: None,
            fallback: [0.5, 0.5, 0.5],
        }
    }
}

impl ColourOptions {
    /// Built-in colour map, overlaid with the configured file if any.
    ///
    /// # Errors
    ///
    /// [`MolpassError::Io`] or [`MolpassError::ColourMapParse`] if the
    /// configured file cannot be used.
    pub fn build_map(&self) -> Result<ColourMap, MolpassError> {
        let mut map = ColourMap::builtin();
        if let Some(path) = &self.colour_map {
            let text = std::fs::read_to_string(path).map_err(MolpassError::Io)?;
            map.extend_from_str(&text)?;
            log::info!("loaded colour map {}", path.display());
        }
        map.set_fallback(Colour::from_f32(self.fallback));
        Ok(map)
    }
}
