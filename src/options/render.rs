use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Global render toggles shared by every pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct RenderOptions {
    /// Specular highlights in the lit draw passes.
    pub specular: bool,
    /// Run the shadow pass.
    pub shadows: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            specular: true,
            shadows: false,
        }
    }
}
