//! Bucketed pool of [`GeometryBuffer`]s.
//!
//! Buffers are grouped by [`BufferKey`] so everything sharing a render
//! format, pass tag and primitive mode can be drawn from the same few
//! buffers. The pool hands out write positions ([`Occupancy`]), counts
//! the occupants referencing each buffer and deletes invalid buffers once
//! nothing references them.

use std::collections::BTreeMap;

use super::geometry_buffer::{GeometryBuffer, PrimitiveMode, UploadOp};
use super::vertex_format::VertexFormat;
use crate::registry::Token;
use crate::renderer::pass::RenderTag;
use crate::util::arena::{Arena, Index};

/// Bucket key: everything that must match for two occupants to share a
/// draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferKey {
    /// Render format token.
    pub format: Token,
    /// Pass tag.
    pub tag: RenderTag,
    /// Primitive assembly.
    pub mode: PrimitiveMode,
}

/// Stable handle to a pooled buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(Index);

/// Where a renderable's geometry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    /// Buffer holding the vertices.
    pub buffer: BufferId,
    /// First vertex index.
    pub first: u32,
    /// Vertex count.
    pub count: u32,
}

struct PooledBuffer {
    buffer: GeometryBuffer,
    key: BufferKey,
    occupants: u32,
}

/// Buffers bucketed by [`BufferKey`].
pub struct BufferPool {
    format: VertexFormat,
    default_capacity: u32,
    buffers: Arena<PooledBuffer>,
    buckets: BTreeMap<BufferKey, Vec<BufferId>>,
}

impl BufferPool {
    /// Pool creating buffers of `format` with `default_capacity` vertices.
    #[must_use]
    pub fn new(format: VertexFormat, default_capacity: u32) -> Self {
        Self {
            format,
            default_capacity: default_capacity.max(1),
            buffers: Arena::new(),
            buckets: BTreeMap::new(),
        }
    }

    /// Vertex layout shared by every buffer in the pool.
    #[must_use]
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    /// Capacity of newly created buffers.
    #[must_use]
    pub fn default_capacity(&self) -> u32 {
        self.default_capacity
    }

    /// A buffer in `key`'s bucket with at least `needed` free vertices.
    ///
    /// Reuses the first valid buffer with room, otherwise creates one.
    /// Occupants larger than the default capacity get a dedicated buffer
    /// sized to fit.
    pub fn acquire(&mut self, key: BufferKey, needed: u32) -> BufferId {
        let bucket = self.buckets.entry(key).or_default();
        let existing = bucket.iter().copied().find(|id| {
            self.buffers.get(id.0).is_some_and(|pooled| {
                pooled.buffer.is_valid() && pooled.buffer.free_vertices() >= needed
            })
        });
        if let Some(id) = existing {
            return id;
        }

        let capacity = if needed > self.default_capacity {
            log::info!(
                "{} KB vertex buffer requested that exceeds default size",
                needed as usize * self.format.stride() / 1024
            );
            needed
        } else {
            self.default_capacity
        };
        let id = BufferId(self.buffers.insert(PooledBuffer {
            buffer: GeometryBuffer::new(self.format.clone(), capacity),
            key,
            occupants: 0,
        }));
        bucket.push(id);
        log::debug!(
            "created geometry buffer for {key:?}: {capacity} vertices ({} buckets)",
            self.buckets.len()
        );
        id
    }

    /// Claim `count` vertices in `key`'s bucket and park the buffer's
    /// cursor at the first of them.
    pub fn reserve(&mut self, key: BufferKey, count: u32) -> Occupancy {
        let id = self.acquire(key, count);
        let mut first = 0;
        if let Some(pooled) = self.buffers.get_mut(id.0) {
            pooled.buffer.seek_end();
            pooled.occupants += 1;
            first = pooled.buffer.used_vertices();
        }
        Occupancy {
            buffer: id,
            first,
            count,
        }
    }

    /// Drop one occupant reference from `occupancy`'s buffer.
    pub fn release(&mut self, occupancy: &Occupancy) {
        if let Some(pooled) = self.buffers.get_mut(occupancy.buffer.0) {
            pooled.occupants = pooled.occupants.saturating_sub(1);
        }
    }

    /// Mark a buffer invalid.
    pub fn invalidate(&mut self, id: BufferId) {
        if let Some(pooled) = self.buffers.get_mut(id.0) {
            pooled.buffer.invalidate();
        }
    }

    /// Delete every invalid buffer with no occupants. Returns how many
    /// were deleted.
    pub fn sweep_invalid(&mut self) -> usize {
        let doomed: Vec<BufferId> = self
            .buffers
            .iter()
            .filter(|(_, pooled)| !pooled.buffer.is_valid() && pooled.occupants == 0)
            .map(|(index, _)| BufferId(index))
            .collect();
        for id in &doomed {
            if let Some(pooled) = self.buffers.remove(id.0) {
                if let Some(bucket) = self.buckets.get_mut(&pooled.key) {
                    bucket.retain(|other| other != id);
                }
            }
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        if !doomed.is_empty() {
            log::debug!("swept {} invalid geometry buffers", doomed.len());
        }
        doomed.len()
    }

    /// Shared access to a buffer.
    #[must_use]
    pub fn get(&self, id: BufferId) -> Option<&GeometryBuffer> {
        self.buffers.get(id.0).map(|pooled| &pooled.buffer)
    }

    /// Mutable access to a buffer.
    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut GeometryBuffer> {
        self.buffers.get_mut(id.0).map(|pooled| &mut pooled.buffer)
    }

    /// Returns `true` if `id` names a live buffer.
    #[must_use]
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains(id.0)
    }

    /// Bucket a buffer belongs to.
    #[must_use]
    pub fn key_of(&self, id: BufferId) -> Option<BufferKey> {
        self.buffers.get(id.0).map(|pooled| pooled.key)
    }

    /// Number of occupants referencing a buffer.
    #[must_use]
    pub fn occupants(&self, id: BufferId) -> u32 {
        self.buffers.get(id.0).map_or(0, |pooled| pooled.occupants)
    }

    /// Buckets in key order.
    pub fn buckets(&self) -> impl Iterator<Item = (&BufferKey, &[BufferId])> {
        self.buckets.iter().map(|(key, ids)| (key, ids.as_slice()))
    }

    /// Live buffers in creation-slot order.
    pub fn buffers(&self) -> impl Iterator<Item = (BufferId, &GeometryBuffer)> {
        self.buffers
            .iter()
            .map(|(index, pooled)| (BufferId(index), &pooled.buffer))
    }

    /// Number of live buffers.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Vertices below the high-water mark across all buffers.
    #[must_use]
    pub fn used_vertices(&self) -> u64 {
        self.buffers
            .iter()
            .map(|(_, pooled)| u64::from(pooled.buffer.used_vertices()))
            .sum()
    }

    /// Queue uploads for anything written since the last full upload.
    pub fn sync_all(&mut self) {
        for (_, pooled) in self.buffers.iter_mut() {
            pooled.buffer.sync();
        }
    }

    /// Hand every pending upload to `apply`, emptying the queues.
    pub fn drain_uploads(
        &mut self,
        mut apply: impl FnMut(BufferId, &GeometryBuffer, UploadOp),
    ) {
        for (index, pooled) in self.buffers.iter_mut() {
            for op in pooled.buffer.take_uploads() {
                apply(BufferId(index), &pooled.buffer, op);
            }
        }
    }

    /// Delete every buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn key(tag: RenderTag) -> BufferKey {
        BufferKey {
            format: Token::from_raw(1),
            tag,
            mode: PrimitiveMode::Triangles,
        }
    }

    fn fill(pool: &mut BufferPool, occupancy: &Occupancy) {
        let buffer = pool.get_mut(occupancy.buffer).unwrap();
        for _ in 0..occupancy.count {
            buffer.try_write_position(Vec3::ONE).unwrap();
            buffer.try_advance().unwrap();
        }
    }

    #[test]
    fn acquire_always_has_room() {
        let mut pool = BufferPool::new(VertexFormat::default(), 10);
        for needed in [3, 3, 3, 3, 7, 1, 10] {
            let occupancy = pool.reserve(key(RenderTag::Solid), needed);
            let buffer = pool.get(occupancy.buffer).unwrap();
            assert!(buffer.free_vertices() >= needed);
            fill(&mut pool, &occupancy);
        }
        assert!(pool.buffer_count() > 1);
    }

    #[test]
    fn reservations_are_contiguous_within_a_buffer() {
        let mut pool = BufferPool::new(VertexFormat::default(), 16);
        let a = pool.reserve(key(RenderTag::Solid), 3);
        fill(&mut pool, &a);
        let b = pool.reserve(key(RenderTag::Solid), 3);
        fill(&mut pool, &b);
        assert_eq!(a.buffer, b.buffer);
        assert_eq!((a.first, b.first), (0, 3));
        assert_eq!(pool.occupants(a.buffer), 2);
    }

    #[test]
    fn different_tags_use_different_buckets() {
        let mut pool = BufferPool::new(VertexFormat::default(), 16);
        let solid = pool.acquire(key(RenderTag::Solid), 3);
        let outline = pool.acquire(key(RenderTag::Outline), 3);
        assert_ne!(solid, outline);
        assert_eq!(pool.key_of(outline), Some(key(RenderTag::Outline)));
        assert_eq!(pool.buckets().count(), 2);
    }

    #[test]
    fn oversized_request_gets_dedicated_buffer() {
        let mut pool = BufferPool::new(VertexFormat::default(), 8);
        let occupancy = pool.reserve(key(RenderTag::Solid), 20);
        assert_eq!(pool.get(occupancy.buffer).unwrap().capacity(), 20);
        fill(&mut pool, &occupancy);
        assert_eq!(pool.used_vertices(), 20);
    }

    #[test]
    fn sweep_waits_for_occupants_to_leave() {
        let mut pool = BufferPool::new(VertexFormat::default(), 8);
        let occupancy = pool.reserve(key(RenderTag::Solid), 2);
        pool.invalidate(occupancy.buffer);
        assert_eq!(pool.sweep_invalid(), 0);
        pool.release(&occupancy);
        assert_eq!(pool.sweep_invalid(), 1);
        assert!(!pool.contains(occupancy.buffer));
        assert_eq!(pool.buckets().count(), 0);
    }

    #[test]
    fn invalid_buffers_are_not_reused() {
        let mut pool = BufferPool::new(VertexFormat::default(), 8);
        let first = pool.acquire(key(RenderTag::Solid), 1);
        pool.invalidate(first);
        let second = pool.acquire(key(RenderTag::Solid), 1);
        assert_ne!(first, second);
    }
}
