//! The molecular scene: managers, selections and the pass scheduler.
//!
//! [`MolecularScene`] is the surface hosts talk to. Methods are split by
//! concern across the submodules, each adding an `impl MolecularScene`
//! block:
//!
//! - `scene_management`: load, create, destroy, lookup, clear
//! - `apply`: selection commands (`set_colour`, `set_tag`, ...)
//! - `rendering`: prepare, per-pass draw lists, GPU sync, global toggles

mod apply;
pub mod command;
mod rendering;
mod scene_management;
pub mod selection;

pub use self::scene_management::LoadStats;

use self::selection::SelectionSets;
use crate::colour::ColourMap;
use crate::error::MolpassError;
use crate::gpu::buffer_pool::BufferPool;
use crate::gpu::vertex_format::VertexFormat;
use crate::options::Options;
use crate::registry::{Token, TokenRegistry, RENDER_FORMAT, RENDER_OPTION};
use crate::renderable::store::RenderableHandle;
use crate::renderer::molecular::chain::ChainHandle;
use crate::renderer::molecular::{AtomManager, ChainManager};
use crate::renderer::picking::PickMap;
use crate::renderer::scheduler::PassScheduler;
use crate::scene::SceneBounds;

/// Registry and colour map shared by every manager of a scene.
#[derive(Debug, Default)]
pub struct RenderEnv {
    /// Render format and option names.
    pub registry: TokenRegistry,
    /// Material colours.
    pub colours: ColourMap,
}

impl RenderEnv {
    /// Environment with an empty registry and `colours`.
    #[must_use]
    pub fn new(colours: ColourMap) -> Self {
        Self {
            registry: TokenRegistry::new(),
            colours,
        }
    }

    /// Environment with the colour map `options` configure.
    ///
    /// # Errors
    ///
    /// Propagates colour map loading errors.
    pub fn from_options(options: &Options) -> Result<Self, MolpassError> {
        Ok(Self::new(options.colours.build_map()?))
    }
}

/// A renderable inside the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableRef {
    /// An atom.
    Atom(RenderableHandle),
    /// A whole chain.
    Chain(ChainHandle),
    /// One residue of a chain.
    Residue(RenderableHandle),
}

/// Atoms and chains of one molecular scene, rendered in passes.
pub struct MolecularScene {
    env: RenderEnv,
    chains: ChainManager,
    atoms: AtomManager,
    scheduler: PassScheduler,
    picks: PickMap,
    selections: SelectionSets,
    bounds: Option<SceneBounds>,
}

impl MolecularScene {
    /// Empty scene configured by `options`.
    ///
    /// # Errors
    ///
    /// Propagates colour map loading errors.
    pub fn new(options: &Options) -> Result<Self, MolpassError> {
        Ok(Self::with_env(RenderEnv::from_options(options)?, options))
    }

    /// Empty scene using an existing environment.
    #[must_use]
    pub fn with_env(mut env: RenderEnv, options: &Options) -> Self {
        let format = VertexFormat::parse(&options.buffers.vertex_format);
        let capacity = options.buffers.default_capacity(format.stride());
        log::debug!(
            "scene buffers: format '{format}', stride {}, {capacity} vertices each",
            format.stride()
        );
        let mut chains = ChainManager::new(
            &mut env.registry,
            BufferPool::new(format.clone(), capacity),
            &options.geometry,
        );
        chains.set_level_of_detail(options.geometry.chain_lod);
        let mut atoms = AtomManager::new(
            &mut env.registry,
            BufferPool::new(format, capacity),
            &options.geometry,
        );
        atoms.set_level_of_detail(options.geometry.atom_lod);
        Self {
            env,
            chains,
            atoms,
            scheduler: PassScheduler::new(&options.render),
            picks: PickMap::new(),
            selections: SelectionSets::default(),
            bounds: None,
        }
    }

    /// Shared registry and colour map.
    #[must_use]
    pub fn env(&self) -> &RenderEnv {
        &self.env
    }

    /// Token of the render format called `name`.
    #[must_use]
    pub fn render_format(&self, name: &str) -> Option<Token> {
        self.env.registry.get(RENDER_FORMAT, name)
    }

    /// Token of the render option called `name`.
    #[must_use]
    pub fn render_option(&self, name: &str) -> Option<Token> {
        self.env.registry.get(RENDER_OPTION, name)
    }

    /// Atom manager.
    #[must_use]
    pub fn atoms(&self) -> &AtomManager {
        &self.atoms
    }

    /// Chain manager.
    #[must_use]
    pub fn chains(&self) -> &ChainManager {
        &self.chains
    }

    /// Pick names handed out so far.
    #[must_use]
    pub fn picks(&self) -> &PickMap {
        &self.picks
    }

    /// Named selections of the last load.
    #[must_use]
    pub fn selections(&self) -> &SelectionSets {
        &self.selections
    }

    /// Bounding sphere of the loaded atoms.
    #[must_use]
    pub fn bounds(&self) -> Option<SceneBounds> {
        self.bounds
    }
}
