use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gpu::vertex_format::DEFAULT_VERTEX_FORMAT;

/// Geometry buffer sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct BufferOptions {
    /// Vertex format descriptor for every pool.
    pub vertex_format: String,
    /// Upper bound on a default buffer's size in bytes.
    pub max_buffer_bytes: u64,
    /// Upper bound on a default buffer's vertex count.
    pub max_elements_vertices: u32,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            vertex_format: DEFAULT_VERTEX_FORMAT.to_owned(),
            max_buffer_bytes: 32 * 1024 * 1024,
            max_elements_vertices: 1_048_576,
        }
    }
}

impl BufferOptions {
    /// Default buffer capacity in vertices for a given stride.
    #[must_use]
    pub fn default_capacity(&self, stride: usize) -> u32 {
        let by_bytes = self.max_buffer_bytes / stride.max(1) as u64;
        by_bytes
            .min(u64::from(self.max_elements_vertices))
            .clamp(1, u64::from(u32::MAX)) as u32
    }
}
