//! Draw calls emitted by the managers for one pass.

use std::ops::Range;

use crate::colour::Colour;
use crate::gpu::buffer_pool::BufferId;
use crate::gpu::geometry_buffer::PrimitiveMode;

/// Which manager's pool a buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolId {
    /// Point-object (atom) buffers.
    Atoms,
    /// Segment-object (residue) buffers.
    Residues,
}

/// How the vertex stream should be interpreted by shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingStyle {
    /// Real surface normals.
    Mesh,
    /// Sphere impostors: normal slot holds corner offset and radius.
    Billboard,
}

/// One draw of a buffer range.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Pool the buffer lives in.
    pub pool: PoolId,
    /// Buffer to draw from.
    pub buffer: BufferId,
    /// Primitive assembly.
    pub mode: PrimitiveMode,
    /// Vertex interpretation.
    pub style: ShadingStyle,
    /// Vertex range.
    pub vertices: Range<u32>,
    /// Pick name, in the pick pass.
    pub name: Option<u32>,
    /// Colour replacing vertex colours, in the outline pass.
    pub colour_override: Option<Colour>,
}

impl DrawCall {
    /// Vertex count.
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.end - self.vertices.start
    }

    /// Per-draw value handed to shaders through the instance index: the
    /// pick name, or the override colour packed as `0x01BBGGRR`, or 0.
    /// The marker byte keeps black distinct from "no override".
    #[must_use]
    pub fn instance_value(&self) -> u32 {
        if let Some(name) = self.name {
            return name;
        }
        self.colour_override.map_or(0, |c| {
            u32::from_le_bytes([c.r, c.g, c.b, 0x01])
        })
    }
}

/// Draw calls for one pass, in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    calls: Vec<DrawCall>,
}

impl DrawList {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call. Empty ranges are dropped.
    pub fn push(&mut self, call: DrawCall) {
        if call.vertices.end > call.vertices.start {
            self.calls.push(call);
        }
    }

    /// Calls in order.
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` if there are no calls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Total vertices across all calls.
    #[must_use]
    pub fn vertex_count(&self) -> u64 {
        self.calls.iter().map(|c| u64::from(c.vertex_count())).sum()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCall;
    type IntoIter = std::slice::Iter<'a, DrawCall>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.iter()
    }
}
