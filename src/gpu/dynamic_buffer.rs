//! GPU copies of pooled geometry buffers.
//!
//! Every live [`GeometryBuffer`](super::geometry_buffer::GeometryBuffer)
//! gets one fixed-size wgpu vertex buffer. Pending [`UploadOp`]s are
//! drained from the pool each frame and applied with `queue.write_buffer`;
//! GPU buffers whose CPU buffer was swept are dropped.
//!
//! A store must see every drain of the pools it mirrors, otherwise the GPU
//! copy misses the skipped writes.

use std::ops::Range;

use rustc_hash::FxHashMap;

use super::buffer_pool::{BufferId, BufferPool};
use super::geometry_buffer::UploadOp;
use crate::renderer::draw_list::PoolId;

/// Byte alignment `queue.write_buffer` requires of offsets and sizes.
const COPY_ALIGNMENT: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

/// Round `range` out to [`COPY_ALIGNMENT`]. The end may pass `len` when
/// `len` itself is unaligned; the caller pads.
fn aligned(range: Range<usize>) -> Range<usize> {
    let start = range.start / COPY_ALIGNMENT * COPY_ALIGNMENT;
    let end = range.end.div_ceil(COPY_ALIGNMENT) * COPY_ALIGNMENT;
    start..end
}

/// Bytes `range` of `data`, zero-padded where the aligned range runs past
/// the end.
fn aligned_bytes(data: &[u8], op: UploadOp) -> (u64, Vec<u8>) {
    let range = aligned(op.bytes());
    let end = range.end.min(data.len());
    let start = range.start.min(end);
    let mut bytes = data[start..end].to_vec();
    bytes.resize(range.end - range.start, 0);
    (range.start as u64, bytes)
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

/// Upload counters for one [`GpuVertexStore::sync`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// GPU buffers created.
    pub created: usize,
    /// GPU buffers dropped.
    pub dropped: usize,
    /// Upload operations applied.
    pub uploads: usize,
    /// Bytes written.
    pub bytes: u64,
}

/// wgpu vertex buffers mirroring the pools, keyed by (pool, buffer).
#[derive(Default)]
pub struct GpuVertexStore {
    buffers: FxHashMap<(PoolId, BufferId), GpuBuffer>,
}

impl GpuVertexStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the GPU copies of `pool` up to date.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pool_id: PoolId,
        pool: &mut BufferPool,
    ) -> SyncStats {
        let mut stats = SyncStats::default();

        let before = self.buffers.len();
        self.buffers
            .retain(|&(owner, id), _| owner != pool_id || pool.contains(id));
        stats.dropped = before - self.buffers.len();

        for (id, geometry) in pool.buffers() {
            let _ = self.buffers.entry((pool_id, id)).or_insert_with(|| {
                stats.created += 1;
                let size = aligned(0..geometry.bytes().len()).end as u64;
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{pool_id:?} Vertex Buffer")),
                    size,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                GpuBuffer { buffer, size }
            });
        }

        let buffers = &self.buffers;
        pool.drain_uploads(|id, geometry, op| {
            let Some(gpu) = buffers.get(&(pool_id, id)) else {
                return;
            };
            let (offset, bytes) = aligned_bytes(geometry.bytes(), op);
            if bytes.is_empty() || offset + bytes.len() as u64 > gpu.size {
                return;
            }
            queue.write_buffer(&gpu.buffer, offset, &bytes);
            stats.uploads += 1;
            stats.bytes += bytes.len() as u64;
        });

        if stats.created > 0 || stats.dropped > 0 {
            log::debug!(
                "{pool_id:?} GPU buffers: {} created, {} dropped, {} live",
                stats.created,
                stats.dropped,
                self.buffers.len()
            );
        }
        stats
    }

    /// GPU copy of `id` in `pool`.
    #[must_use]
    pub fn buffer(&self, pool: PoolId, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&(pool, id)).map(|gpu| &gpu.buffer)
    }

    /// Number of GPU buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if no GPU buffers exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Drop every GPU buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_round_out_to_four_bytes() {
        assert_eq!(aligned(0..28), 0..28);
        assert_eq!(aligned(30..45), 28..48);
        assert_eq!(aligned(4..4), 4..4);
    }

    #[test]
    fn unaligned_tail_is_zero_padded() {
        let data: Vec<u8> = (1..=15).collect();
        let (offset, bytes) = aligned_bytes(&data, UploadOp::Range { offset: 9, len: 6 });
        assert_eq!(offset, 8);
        assert_eq!(bytes, vec![9, 10, 11, 12, 13, 14, 15, 0]);
    }

    #[test]
    fn full_upload_starts_at_zero() {
        let data = vec![7u8; 56];
        let (offset, bytes) = aligned_bytes(&data, UploadOp::Full { len: 28 });
        assert_eq!(offset, 0);
        assert_eq!(bytes.len(), 28);
    }
}
