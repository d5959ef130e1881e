//! Segment-object renderables (residues) and their aggregate (chains).
//!
//! Each residue with a Cα owns a tube window of its chain's centreline.
//! Chains carry render state but no geometry; commands applied to a chain
//! fan out to its residues. All residues share one nested store, so the
//! chain manager owns exactly one buffer pool.

use rustc_hash::FxHashMap;

use super::backbone::mesh::{self, TubeShape};
use super::backbone::{BreakThresholds, ExtrusionPath};
use crate::colour::{residue_key, Colour, ColourMap, CHAIN_KEY};
use crate::engine::command::Command;
use crate::gpu::buffer_pool::BufferPool;
use crate::gpu::geometry_buffer::{BufferError, GeometryBuffer, PrimitiveMode};
use crate::options::{GeometryOptions, MAX_CHAIN_LOD, MIN_CHAIN_LOD};
use crate::registry::{Token, TokenRegistry, RENDER_FORMAT, RENDER_OPTION};
use crate::renderable::store::{RebuildStats, RenderableHandle, RenderableStore};
use crate::renderable::{Change, RenderState, Renderable};
use crate::renderer::draw_list::{DrawList, PoolId, ShadingStyle};
use crate::renderer::pass::RenderPass;
use crate::scene::{ChainRecord, ObjectId};
use crate::util::arena::{Arena, Index};

/// Format name: uniform tube along the Cα trace.
pub const BACKBONE_TRACE: &str = "Backbone Trace";
/// Format name: tube widened through helices and sheets.
pub const CARTOON: &str = "Cartoon";
/// Option name: smooth the centreline.
pub const SMOOTH_BACKBONES: &str = "Smooth Backbones";
/// Option name: thick backbone trace.
pub const CHUNKY_BACKBONES: &str = "Chunky Backbones";

/// Default chain and residue alpha.
pub const CHAIN_ALPHA: u8 = 75;

/// Format and option tokens understood by the chain manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTokens {
    /// [`BACKBONE_TRACE`].
    pub backbone_trace: Token,
    /// [`CARTOON`].
    pub cartoon: Token,
    /// [`SMOOTH_BACKBONES`].
    pub smooth: Token,
    /// [`CHUNKY_BACKBONES`].
    pub chunky: Token,
}

impl ChainTokens {
    /// Intern the chain format and option names.
    pub fn register(registry: &mut TokenRegistry) -> Self {
        Self {
            backbone_trace: registry.intern(RENDER_FORMAT, BACKBONE_TRACE),
            cartoon: registry.intern(RENDER_FORMAT, CARTOON),
            smooth: registry.intern(RENDER_OPTION, SMOOTH_BACKBONES),
            chunky: registry.intern(RENDER_OPTION, CHUNKY_BACKBONES),
        }
    }

    fn supports_format(&self, format: Token) -> bool {
        format == self.backbone_trace || format == self.cartoon
    }
}

/// Manager-level data the residue writer reads.
#[derive(Debug, Clone)]
pub struct BackboneContext {
    tokens: ChainTokens,
    lod: u32,
    tube_radius: f32,
    chunky_scale: f32,
    thresholds: BreakThresholds,
    paths: FxHashMap<ObjectId, ExtrusionPath>,
}

impl BackboneContext {
    fn new(tokens: ChainTokens, geometry: &GeometryOptions) -> Self {
        Self {
            tokens,
            lod: geometry.chain_lod.clamp(MIN_CHAIN_LOD, MAX_CHAIN_LOD),
            tube_radius: geometry.tube_radius,
            chunky_scale: geometry.chunky_scale,
            thresholds: BreakThresholds {
                peptide: geometry.peptide_separation,
                trace: geometry.trace_separation,
            },
            paths: FxHashMap::default(),
        }
    }

    /// Current tessellation level.
    #[must_use]
    pub fn lod(&self) -> u32 {
        self.lod
    }

    /// Centreline of `chain`.
    #[must_use]
    pub fn path(&self, chain: ObjectId) -> Option<&ExtrusionPath> {
        self.paths.get(&chain)
    }

    fn shape(&self, state: &RenderState) -> TubeShape {
        let chunky = state.format == self.tokens.backbone_trace && state.has_option(self.tokens.chunky);
        TubeShape {
            lod: self.lod,
            radius: if chunky {
                self.tube_radius * self.chunky_scale
            } else {
                self.tube_radius
            },
            cartoon: state.format == self.tokens.cartoon,
        }
    }
}

/// One residue's tube window.
#[derive(Debug, Clone)]
pub struct ResidueRenderable {
    state: RenderState,
    chain: ObjectId,
    index: usize,
}

impl ResidueRenderable {
    /// Chain the residue belongs to.
    #[must_use]
    pub fn chain(&self) -> ObjectId {
        self.chain
    }

    /// Position of the residue in its chain record.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Renderable for ResidueRenderable {
    type Context = BackboneContext;

    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn primitive_mode(&self, _ctx: &BackboneContext) -> PrimitiveMode {
        PrimitiveMode::TriangleStrip
    }

    fn vertex_count(&self, ctx: &BackboneContext) -> u32 {
        mesh::tube_vertex_count(ctx.lod)
    }

    fn write_geometry(
        &self,
        ctx: &BackboneContext,
        buffer: &mut GeometryBuffer,
    ) -> Result<(), BufferError> {
        let colour = self.state.vertex_colour();
        let span = ctx.paths.get(&self.chain).and_then(|path| path.span(self.index));
        match span {
            Some((extrusion, local)) => {
                mesh::write_tube(buffer, extrusion, local, ctx.shape(&self.state), colour)
            }
            None => {
                log::warn!("residue {} of chain {:?} has no path", self.index, self.chain);
                mesh::write_collapsed(buffer, glam::Vec3::ZERO, self.vertex_count(ctx), colour)
            }
        }
    }

    fn shading(_ctx: &BackboneContext, _format: Token) -> ShadingStyle {
        ShadingStyle::Mesh
    }
}

/// Handle to a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHandle(Index);

/// Aggregate renderable: render state plus the residues it fans out to.
#[derive(Debug, Clone)]
pub struct ChainRenderable {
    state: RenderState,
    record: ChainRecord,
    residues: Vec<RenderableHandle>,
}

impl ChainRenderable {
    /// Render state.
    #[must_use]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Residue handles in chain order.
    #[must_use]
    pub fn residues(&self) -> &[RenderableHandle] {
        &self.residues
    }

    /// Source record.
    #[must_use]
    pub fn record(&self) -> &ChainRecord {
        &self.record
    }
}

/// What an identity names inside the chain manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTarget {
    /// A whole chain.
    Chain(ChainHandle),
    /// One residue.
    Residue(RenderableHandle),
}

/// Owns chains, their residues and the residue buffer pool.
pub struct ChainManager {
    chains: Arena<ChainRenderable>,
    by_object: FxHashMap<ObjectId, ChainHandle>,
    residues: RenderableStore<ResidueRenderable>,
    ctx: BackboneContext,
}

impl ChainManager {
    /// Empty manager drawing from `pool`.
    pub fn new(registry: &mut TokenRegistry, pool: BufferPool, geometry: &GeometryOptions) -> Self {
        let tokens = ChainTokens::register(registry);
        Self {
            chains: Arena::new(),
            by_object: FxHashMap::default(),
            residues: RenderableStore::new(PoolId::Residues, pool),
            ctx: BackboneContext::new(tokens, geometry),
        }
    }

    fn default_state(&self, colour: Colour) -> RenderState {
        let mut state = RenderState::new(self.ctx.tokens.backbone_trace, colour, CHAIN_ALPHA);
        let _ = state.options.insert(self.ctx.tokens.smooth);
        let _ = state.options.insert(self.ctx.tokens.chunky);
        state
    }

    /// Create the chain for `record` and a residue renderable for every
    /// residue with a Cα. `name` hands out a pick name per residue.
    pub fn create(
        &mut self,
        record: &ChainRecord,
        colours: &ColourMap,
        mut name: impl FnMut(ObjectId) -> u32,
    ) -> ChainHandle {
        if let Some(&handle) = self.by_object.get(&record.id) {
            return handle;
        }
        let state = self.default_state(colours.get_or_default(CHAIN_KEY));
        let smooth = state.has_option(self.ctx.tokens.smooth);
        let path = ExtrusionPath::build(&record.residues, smooth, self.ctx.thresholds);
        let _ = self.ctx.paths.insert(record.id, path);

        let mut residues = Vec::new();
        for (index, residue) in record.residues.iter().enumerate() {
            if residue.ca.is_none() {
                continue;
            }
            let mut residue_state = self.default_state(colours.get_or_default(&residue_key(&residue.name)));
            residue_state.name = name(residue.id);
            let handle = self.residues.insert(
                residue.id,
                ResidueRenderable {
                    state: residue_state,
                    chain: record.id,
                    index,
                },
            );
            residues.push(handle);
        }

        let handle = ChainHandle(self.chains.insert(ChainRenderable {
            state,
            record: record.clone(),
            residues,
        }));
        let _ = self.by_object.insert(record.id, handle);
        log::debug!(
            "created chain {:?}: {} residues, {} extrusions",
            record.id,
            self.chains.get(handle.0).map_or(0, |c| c.residues.len()),
            self.ctx.paths.get(&record.id).map_or(0, ExtrusionPath::extrusion_count)
        );
        handle
    }

    /// Destroy a chain and all its residues.
    pub fn destroy(&mut self, handle: ChainHandle) -> bool {
        let Some(chain) = self.chains.remove(handle.0) else {
            return false;
        };
        let _ = self.by_object.remove(&chain.record.id);
        let _ = self.ctx.paths.remove(&chain.record.id);
        for residue in chain.residues {
            let _ = self.residues.remove(residue);
        }
        true
    }

    /// Destroy one residue, leaving its chain in place.
    pub fn destroy_residue(&mut self, handle: RenderableHandle) -> bool {
        let Some(residue) = self.residues.remove(handle) else {
            return false;
        };
        if let Some(&chain) = self.by_object.get(&residue.chain) {
            if let Some(chain) = self.chains.get_mut(chain.0) {
                chain.residues.retain(|&h| h != handle);
            }
        }
        true
    }

    /// What `object` names here.
    #[must_use]
    pub fn lookup(&self, object: ObjectId) -> Option<ChainTarget> {
        if let Some(&chain) = self.by_object.get(&object) {
            return Some(ChainTarget::Chain(chain));
        }
        self.residues.lookup(object).map(ChainTarget::Residue)
    }

    /// Chain behind `handle`.
    #[must_use]
    pub fn chain(&self, handle: ChainHandle) -> Option<&ChainRenderable> {
        self.chains.get(handle.0)
    }

    /// Apply `command` to a chain or residue. Chain commands fan out to
    /// every residue; the returned change is the chain's own.
    pub fn apply(&mut self, target: ChainTarget, command: &Command) -> Change {
        if command
            .render_format()
            .is_some_and(|format| !self.ctx.tokens.supports_format(format))
        {
            return Change::Unchanged;
        }
        match target {
            ChainTarget::Residue(handle) => self.residues.apply(handle, command, &self.ctx),
            ChainTarget::Chain(handle) => self.apply_to_chain(handle, command),
        }
    }

    fn apply_to_chain(&mut self, handle: ChainHandle, command: &Command) -> Change {
        let Some(chain) = self.chains.get_mut(handle.0) else {
            return Change::Unchanged;
        };
        let change = command.apply(&mut chain.state);
        let smooth = self.ctx.tokens.smooth;
        let resmooth = change != Change::Unchanged
            && matches!(command, Command::SetRenderOption(option, _) if *option == smooth);

        for &residue in &chain.residues {
            let _ = self.residues.apply(residue, command, &self.ctx);
        }

        if resmooth {
            let path = ExtrusionPath::build(
                &chain.record.residues,
                chain.state.has_option(smooth),
                self.ctx.thresholds,
            );
            let _ = self.ctx.paths.insert(chain.record.id, path);
            for &residue in &chain.residues {
                self.residues.relocate(residue);
            }
        }
        change
    }

    /// Rebuild if stale and queue uploads.
    pub fn prepare(&mut self) -> RebuildStats {
        self.residues.prepare(&self.ctx)
    }

    /// Append draws for `pass`.
    pub fn draw(&self, pass: RenderPass, out: &mut DrawList) {
        self.residues.draw(pass, &self.ctx, out);
    }

    /// Change tube tessellation for geometry written from now on.
    pub fn set_level_of_detail(&mut self, lod: u32) {
        self.ctx.lod = lod.clamp(MIN_CHAIN_LOD, MAX_CHAIN_LOD);
    }

    /// Current tessellation level.
    #[must_use]
    pub fn level_of_detail(&self) -> u32 {
        self.ctx.lod
    }

    /// Formats this manager draws.
    #[must_use]
    pub fn render_formats(&self) -> Vec<Token> {
        vec![self.ctx.tokens.backbone_trace, self.ctx.tokens.cartoon]
    }

    /// Options this manager reads.
    #[must_use]
    pub fn render_options(&self) -> Vec<Token> {
        vec![self.ctx.tokens.smooth, self.ctx.tokens.chunky]
    }

    /// Writer context.
    #[must_use]
    pub fn context(&self) -> &BackboneContext {
        &self.ctx
    }

    /// Nested residue store.
    #[must_use]
    pub fn residues(&self) -> &RenderableStore<ResidueRenderable> {
        &self.residues
    }

    /// Mutable residue store, for draining uploads.
    pub fn residues_mut(&mut self) -> &mut RenderableStore<ResidueRenderable> {
        &mut self.residues
    }

    /// Number of chains.
    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Drop every chain, residue and buffer.
    pub fn clear(&mut self) {
        self.chains.clear();
        self.by_object.clear();
        self.ctx.paths.clear();
        self.residues.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::gpu::vertex_format::VertexFormat;
    use crate::renderer::pass::RenderTag;
    use crate::scene::{ResidueRecord, SSType};

    fn manager() -> (ChainManager, TokenRegistry) {
        let mut registry = TokenRegistry::new();
        let pool = BufferPool::new(VertexFormat::default(), 1 << 16);
        let manager = ChainManager::new(&mut registry, pool, &GeometryOptions::default());
        (manager, registry)
    }

    fn chain(id: u64, xs: &[f32]) -> ChainRecord {
        ChainRecord {
            id: ObjectId(id),
            residues: xs
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    ResidueRecord::trace(
                        ObjectId(id * 1000 + i as u64),
                        "GLY",
                        Vec3::new(x, 0.0, 0.0),
                        SSType::Coil,
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn creates_one_residue_per_ca() {
        let (mut chains, _) = manager();
        let mut record = chain(1, &[0.0, 3.8, 7.6]);
        record.residues[2].ca = None;
        let h = chains.create(&record, &ColourMap::builtin(), |_| 0);
        assert_eq!(chains.chain(h).unwrap().residues().len(), 2);
        assert_eq!(chains.lookup(ObjectId(1)), Some(ChainTarget::Chain(h)));
        assert!(matches!(chains.lookup(ObjectId(1000)), Some(ChainTarget::Residue(_))));
        assert_eq!(chains.lookup(ObjectId(1002)), None);
    }

    #[test]
    fn defaults_are_chunky_smooth_trace() {
        let (mut chains, registry) = manager();
        let h = chains.create(&chain(1, &[0.0, 3.8]), &ColourMap::builtin(), |_| 0);
        let state = chains.chain(h).unwrap().state();
        assert_eq!(Some(state.format), registry.get(RENDER_FORMAT, BACKBONE_TRACE));
        assert_eq!(state.alpha, CHAIN_ALPHA);
        assert!(state.has_option(registry.get(RENDER_OPTION, SMOOTH_BACKBONES).unwrap()));
        assert!(state.has_option(registry.get(RENDER_OPTION, CHUNKY_BACKBONES).unwrap()));
    }

    #[test]
    fn chain_commands_fan_out() {
        let (mut chains, _) = manager();
        let h = chains.create(&chain(1, &[0.0, 3.8, 7.6]), &ColourMap::builtin(), |_| 0);
        let _ = chains.prepare();
        let change = chains.apply(ChainTarget::Chain(h), &Command::SetTag(RenderTag::Transparent));
        assert_eq!(change, Change::Placement);
        let _ = chains.prepare();
        for (_, _, residue) in chains.residues().iter() {
            assert_eq!(residue.state().tag, RenderTag::Transparent);
            assert!(residue.state().occupancy().is_some());
        }
    }

    #[test]
    fn residue_vertex_count_follows_lod() {
        let (mut chains, _) = manager();
        let _ = chains.create(&chain(1, &[0.0, 3.8, 7.6]), &ColourMap::builtin(), |_| 0);
        let _ = chains.prepare();
        assert_eq!(
            chains.residues().occupied_vertices(),
            3 * u64::from(mesh::tube_vertex_count(MIN_CHAIN_LOD))
        );
        chains.set_level_of_detail(3);
        assert_eq!(chains.level_of_detail(), MIN_CHAIN_LOD);
    }

    #[test]
    fn level_of_detail_is_capped() {
        let mut registry = TokenRegistry::new();
        let geometry = GeometryOptions {
            chain_lod: 50_000,
            ..GeometryOptions::default()
        };
        let pool = BufferPool::new(VertexFormat::default(), 1 << 16);
        let mut chains = ChainManager::new(&mut registry, pool, &geometry);
        assert_eq!(chains.level_of_detail(), MAX_CHAIN_LOD);
        chains.set_level_of_detail(12);
        assert_eq!(chains.level_of_detail(), 12);
        chains.set_level_of_detail(u32::MAX);
        assert_eq!(chains.level_of_detail(), MAX_CHAIN_LOD);
    }

    #[test]
    fn toggling_smooth_recomputes_path_and_relocates() {
        let (mut chains, registry) = manager();
        let mut record = chain(1, &[0.0, 3.8, 7.6]);
        record.residues[1].ca = Some(Vec3::new(3.8, 1.0, 0.0));
        let h = chains.create(&record, &ColourMap::builtin(), |_| 0);
        let _ = chains.prepare();
        let smoothed = chains.context().path(ObjectId(1)).unwrap().centre_of(1).unwrap();

        let smooth = registry.get(RENDER_OPTION, SMOOTH_BACKBONES).unwrap();
        let change = chains.apply(ChainTarget::Chain(h), &Command::SetRenderOption(smooth, false));
        assert_eq!(change, Change::Placement);
        assert!(chains.residues().is_stale());
        let sharp = chains.context().path(ObjectId(1)).unwrap().centre_of(1).unwrap();
        assert!(sharp.y > smoothed.y);
        let _ = chains.prepare();
        assert!(chains.chain(h).unwrap().residues().iter().all(|&r| chains.residues().occupancy(r).is_some()));
    }

    #[test]
    fn unsupported_format_is_skipped() {
        let (mut chains, mut registry) = manager();
        let h = chains.create(&chain(1, &[0.0, 3.8]), &ColourMap::builtin(), |_| 0);
        let spacefill = registry.intern(RENDER_FORMAT, "Spacefill");
        assert_eq!(
            chains.apply(ChainTarget::Chain(h), &Command::SetRenderFormat(spacefill)),
            Change::Unchanged
        );
    }

    #[test]
    fn destroy_drops_residues_and_path() {
        let (mut chains, _) = manager();
        let h = chains.create(&chain(1, &[0.0, 3.8]), &ColourMap::builtin(), |_| 0);
        let _ = chains.prepare();
        assert!(chains.destroy(h));
        assert!(chains.residues().is_empty());
        assert!(chains.context().path(ObjectId(1)).is_none());
        let stats = chains.prepare();
        assert_eq!(stats.swept, 1);
        assert!(!chains.destroy(h));
    }

    #[test]
    fn pick_names_come_from_the_callback() {
        let (mut chains, _) = manager();
        let mut next = 0;
        let _ = chains.create(&chain(1, &[0.0, 3.8]), &ColourMap::builtin(), |_| {
            next += 1;
            next
        });
        let names: Vec<u32> = chains.residues().iter().map(|(_, _, r)| r.state().name).collect();
        assert_eq!(names, vec![1, 2]);
    }
}
