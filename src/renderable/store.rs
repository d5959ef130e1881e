//! Renderable storage and the lazy rebuild protocol.
//!
//! A [`RenderableStore`] owns one [`BufferPool`] and every renderable of
//! one kind. Commands that move an occupant (visibility, format, tag,
//! options) release its occupancy, invalidate the buffer it lived in and
//! mark the store stale. Commands that only recolour rewrite the
//! occupant's vertices in place. [`RenderableStore::rebuild`] reconciles
//! everything once, before the next draw.

use rustc_hash::FxHashMap;

use super::{Change, Renderable};
use crate::engine::command::Command;
use crate::gpu::buffer_pool::{BufferPool, Occupancy};
use crate::renderer::draw_list::{DrawCall, DrawList, PoolId};
use crate::renderer::pass::{PassDispatch, RenderPass};
use crate::scene::ObjectId;
use crate::util::arena::{Arena, Index};

/// Handle to a renderable inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableHandle(Index);

/// Buffer validity of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Every shown occupant has geometry in a valid buffer.
    Valid,
    /// A rebuild is owed before the next draw.
    Stale,
}

/// Counters from one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Occupancies cleared because their buffer was invalid.
    pub released: usize,
    /// Buffers deleted.
    pub swept: usize,
    /// Occupants written into buffers.
    pub populated: usize,
}

struct Entry<R> {
    object: ObjectId,
    renderable: R,
}

/// Owns renderables of one kind and their buffer pool.
pub struct RenderableStore<R: Renderable> {
    pool_id: PoolId,
    pool: BufferPool,
    entries: Arena<Entry<R>>,
    by_object: FxHashMap<ObjectId, RenderableHandle>,
    state: BufferState,
}

impl<R: Renderable> RenderableStore<R> {
    /// Empty store drawing from `pool`.
    #[must_use]
    pub fn new(pool_id: PoolId, pool: BufferPool) -> Self {
        Self {
            pool_id,
            pool,
            entries: Arena::new(),
            by_object: FxHashMap::default(),
            state: BufferState::Valid,
        }
    }

    /// Add a renderable for `object`. If one already exists its handle is
    /// returned and `renderable` is dropped.
    pub fn insert(&mut self, object: ObjectId, renderable: R) -> RenderableHandle {
        if let Some(&handle) = self.by_object.get(&object) {
            return handle;
        }
        let handle = RenderableHandle(self.entries.insert(Entry { object, renderable }));
        let _ = self.by_object.insert(object, handle);
        self.state = BufferState::Stale;
        handle
    }

    /// Remove a renderable, invalidating the buffer it occupied.
    pub fn remove(&mut self, handle: RenderableHandle) -> Option<R> {
        let mut entry = self.entries.remove(handle.0)?;
        let _ = self.by_object.remove(&entry.object);
        Self::vacate(&mut self.pool, &mut entry.renderable);
        self.state = BufferState::Stale;
        Some(entry.renderable)
    }

    /// Handle of the renderable for `object`.
    #[must_use]
    pub fn lookup(&self, object: ObjectId) -> Option<RenderableHandle> {
        self.by_object.get(&object).copied()
    }

    /// Renderable behind `handle`.
    #[must_use]
    pub fn get(&self, handle: RenderableHandle) -> Option<&R> {
        self.entries.get(handle.0).map(|entry| &entry.renderable)
    }

    /// External identity of `handle`.
    #[must_use]
    pub fn object(&self, handle: RenderableHandle) -> Option<ObjectId> {
        self.entries.get(handle.0).map(|entry| entry.object)
    }

    /// Renderables in insertion-slot order.
    pub fn iter(&self) -> impl Iterator<Item = (RenderableHandle, ObjectId, &R)> {
        self.entries
            .iter()
            .map(|(index, entry)| (RenderableHandle(index), entry.object, &entry.renderable))
    }

    /// Number of renderables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every renderable and buffer.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_object.clear();
        self.pool.clear();
        self.state = BufferState::Valid;
    }

    /// Buffer validity.
    #[must_use]
    pub fn buffer_state(&self) -> BufferState {
        self.state
    }

    /// Returns `true` if a rebuild is owed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state == BufferState::Stale
    }

    /// The buffer pool.
    #[must_use]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Mutable buffer pool, for draining uploads.
    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    /// Which pool id draws from this store carry.
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Vertices held by current occupancies.
    #[must_use]
    pub fn occupied_vertices(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|(_, entry)| entry.renderable.state().occupancy)
            .map(|occupancy| u64::from(occupancy.count))
            .sum()
    }

    /// Apply `command` to one renderable and react to the change.
    pub fn apply(
        &mut self,
        handle: RenderableHandle,
        command: &Command,
        ctx: &R::Context,
    ) -> Change {
        let Some(entry) = self.entries.get_mut(handle.0) else {
            return Change::Unchanged;
        };
        let change = command.apply(entry.renderable.state_mut());
        match change {
            Change::Unchanged => {}
            Change::Placement => {
                Self::vacate(&mut self.pool, &mut entry.renderable);
                self.state = BufferState::Stale;
            }
            Change::Appearance => {
                if !Self::rewrite(&mut self.pool, &mut entry.renderable, ctx) {
                    self.state = BufferState::Stale;
                }
            }
        }
        change
    }

    /// Move an occupant out of its buffer so the next rebuild places it
    /// afresh. Used when geometry inputs outside [`super::RenderState`]
    /// change, e.g. a backbone path.
    pub fn relocate(&mut self, handle: RenderableHandle) {
        if let Some(entry) = self.entries.get_mut(handle.0) {
            Self::vacate(&mut self.pool, &mut entry.renderable);
            self.state = BufferState::Stale;
        }
    }

    fn vacate(pool: &mut BufferPool, renderable: &mut R) {
        if let Some(occupancy) = renderable.state_mut().occupancy.take() {
            pool.invalidate(occupancy.buffer);
            pool.release(&occupancy);
        }
    }

    /// Rewrite an occupant's vertices where they are. Returns `false` if
    /// the occupant had to be vacated instead.
    fn rewrite(pool: &mut BufferPool, renderable: &mut R, ctx: &R::Context) -> bool {
        let Some(occupancy) = renderable.state().occupancy else {
            return true;
        };
        if renderable.vertex_count(ctx) != occupancy.count {
            Self::vacate(pool, renderable);
            return false;
        }
        let Some(buffer) = pool.get_mut(occupancy.buffer) else {
            Self::vacate(pool, renderable);
            return false;
        };
        buffer.seek(occupancy.first);
        let written = renderable.write_geometry(ctx, buffer);
        debug_assert!(written.is_ok(), "in-place geometry rewrite failed");
        if let Err(e) = written {
            log::error!("in-place geometry rewrite failed: {e}");
            Self::vacate(pool, renderable);
            return false;
        }
        debug_assert_eq!(buffer.cursor(), occupancy.first + occupancy.count);
        buffer.upload_range(occupancy.first, occupancy.count);
        true
    }

    fn populate(pool: &mut BufferPool, renderable: &mut R, ctx: &R::Context) -> bool {
        let count = renderable.vertex_count(ctx);
        let key = renderable.buffer_key(ctx);
        let occupancy = pool.reserve(key, count);
        let Some(buffer) = pool.get_mut(occupancy.buffer) else {
            return false;
        };
        let written = renderable.write_geometry(ctx, buffer);
        debug_assert!(written.is_ok(), "geometry write failed");
        if let Err(e) = written {
            log::error!("geometry write failed: {e}");
            pool.invalidate(occupancy.buffer);
            pool.release(&occupancy);
            return false;
        }
        debug_assert_eq!(
            buffer.cursor(),
            occupancy.first + count,
            "vertex_count disagrees with vertices written"
        );
        renderable.state_mut().occupancy = Some(occupancy);
        true
    }

    /// Reconcile occupancies with render state if the store is stale.
    pub fn rebuild(&mut self, ctx: &R::Context) -> RebuildStats {
        let mut stats = RebuildStats::default();
        if self.state == BufferState::Valid {
            return stats;
        }

        for (_, entry) in self.entries.iter_mut() {
            let state = entry.renderable.state_mut();
            let Some(occupancy) = state.occupancy else {
                continue;
            };
            if !self.pool.get(occupancy.buffer).is_some_and(|b| b.is_valid()) {
                self.pool.release(&occupancy);
                state.occupancy = None;
                stats.released += 1;
            }
        }

        stats.swept = self.pool.sweep_invalid();

        for (_, entry) in self.entries.iter_mut() {
            let state = entry.renderable.state();
            if state.is_shown()
                && state.occupancy.is_none()
                && Self::populate(&mut self.pool, &mut entry.renderable, ctx)
            {
                stats.populated += 1;
            }
        }

        self.state = BufferState::Valid;
        log::debug!(
            "{:?} rebuild: {} released, {} swept, {} populated, {} buffers",
            self.pool_id,
            stats.released,
            stats.swept,
            stats.populated,
            self.pool.buffer_count()
        );
        stats
    }

    /// Rebuild if needed and queue uploads for fresh writes.
    pub fn prepare(&mut self, ctx: &R::Context) -> RebuildStats {
        let stats = self.rebuild(ctx);
        self.pool.sync_all();
        stats
    }

    /// Append this store's draws for `pass` to `out`.
    pub fn draw(&self, pass: RenderPass, ctx: &R::Context, out: &mut DrawList) {
        match pass.dispatch() {
            PassDispatch::PerObject {
                tags,
                named,
                highlight,
            } => {
                for (_, entry) in self.entries.iter() {
                    let state = entry.renderable.state();
                    if !tags.contains(&state.tag) {
                        continue;
                    }
                    let Some(occupancy) = state.occupancy else {
                        continue;
                    };
                    let Some(buffer) = self.pool.get(occupancy.buffer) else {
                        continue;
                    };
                    let mode = entry.renderable.primitive_mode(ctx);
                    let range = buffer.draw(mode, occupancy.first, occupancy.count);
                    out.push(DrawCall {
                        pool: self.pool_id,
                        buffer: occupancy.buffer,
                        mode,
                        style: R::shading(ctx, state.format),
                        vertices: range.vertices,
                        name: named.then_some(state.name),
                        colour_override: if highlight { state.highlight } else { None },
                    });
                }
            }
            PassDispatch::Batched { tags } => {
                for (key, ids) in self.pool.buckets() {
                    if !tags.contains(&key.tag) {
                        continue;
                    }
                    let style = R::shading(ctx, key.format);
                    for &id in ids {
                        let Some(buffer) = self.pool.get(id) else {
                            continue;
                        };
                        if !buffer.is_valid() {
                            continue;
                        }
                        let range = buffer.draw(key.mode, 0, buffer.used_vertices());
                        out.push(DrawCall {
                            pool: self.pool_id,
                            buffer: id,
                            mode: key.mode,
                            style,
                            vertices: range.vertices,
                            name: None,
                            colour_override: None,
                        });
                    }
                }
            }
        }
    }

    /// Occupancy of `handle`.
    #[must_use]
    pub fn occupancy(&self, handle: RenderableHandle) -> Option<Occupancy> {
        self.get(handle).and_then(|r| r.state().occupancy)
    }
}
