//! Fixed-capacity CPU vertex storage with a lazily synchronized GPU copy.
//!
//! Writers position a cursor, fill attributes through the checked
//! `try_*` calls and advance. Uploads are recorded as pending
//! [`UploadOp`]s against an "uploaded-to" watermark; the GPU mirror in
//! [`super::dynamic_buffer`] drains them into `wgpu` buffers.

use std::fmt;
use std::ops::Range;

use glam::Vec3;

use super::vertex_format::{Attribute, ComponentKind, VertexFormat};

/// Primitive assembly used when drawing a buffer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveMode {
    /// Independent triangles, three vertices each.
    Triangles,
    /// A triangle strip; separate strips are joined with degenerate
    /// triangles.
    TriangleStrip,
}

impl PrimitiveMode {
    /// Matching wgpu topology.
    #[must_use]
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Errors from checked buffer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The cursor reached the end of the buffer.
    CapacityExceeded {
        /// Buffer capacity in vertices.
        capacity: u32,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { capacity } => {
                write!(f, "geometry buffer capacity of {capacity} vertices exceeded")
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// A pending CPU → GPU transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOp {
    /// Upload bytes `0..len`.
    Full {
        /// Byte length to upload.
        len: usize,
    },
    /// Upload bytes `offset..offset + len`.
    Range {
        /// Starting byte.
        offset: usize,
        /// Byte length.
        len: usize,
    },
}

impl UploadOp {
    /// Byte range covered by this operation.
    #[must_use]
    pub fn bytes(self) -> Range<usize> {
        match self {
            Self::Full { len } => 0..len,
            Self::Range { offset, len } => offset..offset + len,
        }
    }
}

/// Counters of uploads issued over the buffer's life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Full uploads.
    pub full: u32,
    /// Ranged uploads.
    pub partial: u32,
}

/// A vertex range ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRange {
    /// Primitive assembly.
    pub mode: PrimitiveMode,
    /// Vertex indices covered.
    pub vertices: Range<u32>,
}

/// Fixed-capacity vertex array plus upload bookkeeping.
pub struct GeometryBuffer {
    format: VertexFormat,
    capacity: u32,
    data: Vec<u8>,
    cursor: u32,
    used: u32,
    valid: bool,
    uploaded_to: usize,
    pending: Vec<UploadOp>,
    stats: UploadStats,
}

impl GeometryBuffer {
    /// Zeroed buffer holding `capacity` vertices of `format`.
    #[must_use]
    pub fn new(format: VertexFormat, capacity: u32) -> Self {
        let capacity = capacity.max(1);
        let data = vec![0; capacity as usize * format.stride()];
        Self {
            format,
            capacity,
            data,
            cursor: 0,
            used: 0,
            valid: true,
            uploaded_to: 0,
            pending: Vec::new(),
            stats: UploadStats::default(),
        }
    }

    /// Vertex layout.
    #[must_use]
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    /// Capacity in vertices.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Bytes per vertex.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.format.stride()
    }

    /// Current cursor (vertex index).
    #[must_use]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// High-water mark in vertices.
    #[must_use]
    pub fn used_vertices(&self) -> u32 {
        self.used
    }

    /// High-water mark in bytes.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.used as usize * self.stride()
    }

    /// Vertex slots not yet claimed by the high-water mark.
    #[must_use]
    pub fn free_vertices(&self) -> u32 {
        self.capacity - self.used
    }

    /// Returns `true` once the cursor has run off the end.
    #[must_use]
    pub fn is_eob(&self) -> bool {
        self.cursor >= self.capacity
    }

    /// Raw bytes of the whole buffer.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Raw bytes of vertices `range`, clamped to capacity.
    #[must_use]
    pub fn vertex_bytes(&self, range: Range<u32>) -> &[u8] {
        let end = range.end.min(self.capacity) as usize * self.stride();
        let start = (range.start as usize * self.stride()).min(end);
        &self.data[start..end]
    }

    fn check_cursor(&self) -> Result<usize, BufferError> {
        if self.is_eob() {
            return Err(BufferError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(self.cursor as usize * self.stride())
    }

    /// Write float components of `attribute` at the cursor.
    ///
    /// Missing components are zero-filled and extra ones dropped. Colour
    /// slots take channel values in `0.0..=1.0`. Attributes the format
    /// does not carry are skipped.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityExceeded`] if the cursor is past the end.
    pub fn try_write(
        &mut self,
        attribute: Attribute,
        values: &[f32],
    ) -> Result<(), BufferError> {
        let base = self.check_cursor()?;
        let Some(slot) = self.format.slot(attribute).copied() else {
            return Ok(());
        };
        let start = base + slot.offset;
        for i in 0..slot.components {
            let value = values.get(i).copied().unwrap_or(0.0);
            match slot.kind {
                ComponentKind::Float32 => {
                    let at = start + i * 4;
                    self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
                }
                ComponentKind::Unorm8 => {
                    self.data[start + i] =
                        (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
        }
        Ok(())
    }

    /// Write the position at the cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityExceeded`] if the cursor is past the end.
    pub fn try_write_position(&mut self, position: Vec3) -> Result<(), BufferError> {
        self.try_write(Attribute::Position, &position.to_array())
    }

    /// Write the normal at the cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityExceeded`] if the cursor is past the end.
    pub fn try_write_normal(&mut self, normal: Vec3) -> Result<(), BufferError> {
        self.try_write(Attribute::Normal, &normal.to_array())
    }

    /// Write an 8-bit RGBA colour at the cursor. `rgb` formats keep the
    /// first three channels.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityExceeded`] if the cursor is past the end.
    pub fn try_write_colour(&mut self, rgba: [u8; 4]) -> Result<(), BufferError> {
        let base = self.check_cursor()?;
        let Some(slot) = self.format.slot(Attribute::Colour).copied() else {
            return Ok(());
        };
        let start = base + slot.offset;
        self.data[start..start + slot.components]
            .copy_from_slice(&rgba[..slot.components]);
        Ok(())
    }

    /// Move the cursor one vertex forward and extend the high-water mark.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityExceeded`] if the cursor is already past the
    /// end.
    pub fn try_advance(&mut self) -> Result<(), BufferError> {
        let _ = self.check_cursor()?;
        self.cursor += 1;
        self.used = self.used.max(self.cursor);
        Ok(())
    }

    /// Jump to vertex `index`, clamped to the last slot. The high-water
    /// mark only moves when [`Self::try_advance`] passes it.
    pub fn seek(&mut self, index: u32) {
        self.cursor = index.min(self.capacity - 1);
    }

    /// Park the cursor at the high-water mark for appending.
    pub(crate) fn seek_end(&mut self) {
        self.cursor = self.used;
    }

    /// Queue a full upload of the used bytes.
    pub fn upload_all(&mut self) {
        self.uploaded_to = 0;
        let len = self.used_bytes();
        self.pending.clear();
        self.pending.push(UploadOp::Full { len });
        self.uploaded_to = len;
        self.stats.full += 1;
    }

    /// Queue an upload of `count` vertices starting at `first`.
    ///
    /// Falls back to [`Self::upload_all`] when the range reaches past the
    /// uploaded-to watermark.
    pub fn upload_range(&mut self, first: u32, count: u32) {
        let stride = self.stride();
        let offset = first as usize * stride;
        let len = count as usize * stride;
        if offset + len > self.uploaded_to {
            self.upload_all();
            return;
        }
        if len > 0 {
            self.pending.push(UploadOp::Range { offset, len });
            self.stats.partial += 1;
        }
    }

    /// Upload everything written since the last full upload. Called
    /// before a buffer is drawn.
    pub fn sync(&mut self) {
        if self.used_bytes() > self.uploaded_to {
            self.upload_all();
        }
    }

    /// Byte offset up to which the GPU copy is current.
    #[must_use]
    pub fn uploaded_to(&self) -> usize {
        self.uploaded_to
    }

    /// Pending uploads, oldest first.
    #[must_use]
    pub fn pending_uploads(&self) -> &[UploadOp] {
        &self.pending
    }

    /// Remove and return the pending uploads.
    pub fn take_uploads(&mut self) -> Vec<UploadOp> {
        std::mem::take(&mut self.pending)
    }

    /// Upload counters.
    #[must_use]
    pub fn upload_stats(&self) -> UploadStats {
        self.stats
    }

    /// Flag the buffer for deletion once no occupant references it.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Clear the invalid flag.
    pub fn validate(&mut self) {
        self.valid = true;
    }

    /// Returns `false` once invalidated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Draw `count` vertices from `first`, clamped to the high-water mark.
    #[must_use]
    pub fn draw(&self, mode: PrimitiveMode, first: u32, count: u32) -> DrawRange {
        let start = first.min(self.used);
        let end = first.saturating_add(count).min(self.used);
        DrawRange {
            mode,
            vertices: start..end,
        }
    }
}

impl fmt::Debug for GeometryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryBuffer")
            .field("format", &self.format.to_string())
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("used", &self.used)
            .field("valid", &self.valid)
            .field("uploaded_to", &self.uploaded_to)
            .finish_non_exhaustive()
    }
}
