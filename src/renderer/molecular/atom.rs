//! Point-object renderables: one atom each.
//!
//! Spacefill and Balls and Sticks draw a single billboard triangle per
//! atom that the shader turns into a sphere impostor. Sphere Mesh writes a
//! real tessellated sphere from a per-manager unit-sphere table.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::colour::{element_key, ColourMap};
use crate::engine::command::Command;
use crate::gpu::buffer_pool::BufferPool;
use crate::gpu::geometry_buffer::{BufferError, GeometryBuffer, PrimitiveMode};
use crate::options::{GeometryOptions, MAX_ATOM_LOD, MIN_ATOM_LOD};
use crate::registry::{Token, TokenRegistry, RENDER_FORMAT};
use crate::renderable::store::{RebuildStats, RenderableHandle, RenderableStore};
use crate::renderable::{emit, Change, RenderState, Renderable};
use crate::renderer::draw_list::{DrawList, PoolId, ShadingStyle};
use crate::renderer::pass::RenderPass;
use crate::scene::{AtomRecord, ObjectId};

/// Format name: van der Waals spheres.
pub const SPACEFILL: &str = "Spacefill";
/// Format name: shrunken spheres.
pub const BALLS_AND_STICKS: &str = "Balls and Sticks";
/// Format name: tessellated spheres.
pub const SPHERE_MESH: &str = "Sphere Mesh";

/// Default atom alpha.
pub const ATOM_ALPHA: u8 = 115;

/// Billboard triangle corners, enclosing the unit disc.
const BILLBOARD_CORNERS: [[f32; 2]; 3] = [[1.0, 1.0], [-3.0, 1.0], [1.0, -3.0]];

/// Render format tokens understood by the atom manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomFormats {
    /// [`SPACEFILL`].
    pub spacefill: Token,
    /// [`BALLS_AND_STICKS`].
    pub balls_and_sticks: Token,
    /// [`SPHERE_MESH`].
    pub sphere_mesh: Token,
}

impl AtomFormats {
    /// Intern the atom format names.
    pub fn register(registry: &mut TokenRegistry) -> Self {
        Self {
            spacefill: registry.intern(RENDER_FORMAT, SPACEFILL),
            balls_and_sticks: registry.intern(RENDER_FORMAT, BALLS_AND_STICKS),
            sphere_mesh: registry.intern(RENDER_FORMAT, SPHERE_MESH),
        }
    }

    /// Every supported format.
    #[must_use]
    pub fn all(&self) -> [Token; 3] {
        [self.spacefill, self.balls_and_sticks, self.sphere_mesh]
    }
}

/// Unit sphere as a triangle strip of `lod` latitude bands, each band
/// bracketed by a repeated first and last vertex.
#[must_use]
pub fn sphere_strip(lod: u32) -> Vec<Vec3> {
    let lod = lod.max(1);
    let longitudes = 2 * lod;
    let at = |lat: u32, lon: u32| {
        let theta = PI * lat as f32 / lod as f32;
        let phi = TAU * lon as f32 / longitudes as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();
        Vec3::new(sin_t * cos_p, sin_t * sin_p, cos_t)
    };

    let mut strip = Vec::with_capacity(sphere_vertex_count(lod) as usize);
    for band in 0..lod {
        strip.push(at(band, 0));
        for lon in 0..=longitudes {
            strip.push(at(band, lon));
            strip.push(at(band + 1, lon));
        }
        strip.push(at(band + 1, longitudes));
    }
    strip
}

/// Vertices in [`sphere_strip`] at `lod`.
#[must_use]
pub fn sphere_vertex_count(lod: u32) -> u32 {
    4 * lod * (lod + 1)
}

/// Manager-level data the atom writer reads.
#[derive(Debug, Clone)]
pub struct AtomContext {
    formats: AtomFormats,
    ball_and_stick_scale: f32,
    lod: u32,
    sphere: Vec<Vec3>,
}

impl AtomContext {
    fn new(formats: AtomFormats, geometry: &GeometryOptions) -> Self {
        let lod = geometry.atom_lod.clamp(MIN_ATOM_LOD, MAX_ATOM_LOD);
        Self {
            formats,
            ball_and_stick_scale: geometry.ball_and_stick_scale,
            lod,
            sphere: sphere_strip(lod),
        }
    }

    /// Current tessellation level.
    #[must_use]
    pub fn lod(&self) -> u32 {
        self.lod
    }

    /// Format tokens.
    #[must_use]
    pub fn formats(&self) -> &AtomFormats {
        &self.formats
    }
}

/// One atom.
#[derive(Debug, Clone)]
pub struct AtomRenderable {
    state: RenderState,
    centre: Vec3,
    radius: f32,
}

impl AtomRenderable {
    /// Atom at `centre` with display `radius`.
    #[must_use]
    pub fn new(state: RenderState, centre: Vec3, radius: f32) -> Self {
        Self {
            state,
            centre,
            radius,
        }
    }

    /// Sphere centre.
    #[must_use]
    pub fn centre(&self) -> Vec3 {
        self.centre
    }
}

impl Renderable for AtomRenderable {
    type Context = AtomContext;

    fn state(&self) -> &RenderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    fn primitive_mode(&self, ctx: &AtomContext) -> PrimitiveMode {
        if self.state.format == ctx.formats.sphere_mesh {
            PrimitiveMode::TriangleStrip
        } else {
            PrimitiveMode::Triangles
        }
    }

    fn vertex_count(&self, ctx: &AtomContext) -> u32 {
        if self.state.format == ctx.formats.sphere_mesh {
            sphere_vertex_count(ctx.lod)
        } else {
            3
        }
    }

    fn write_geometry(
        &self,
        ctx: &AtomContext,
        buffer: &mut GeometryBuffer,
    ) -> Result<(), BufferError> {
        let colour = self.state.vertex_colour();
        if self.state.format == ctx.formats.sphere_mesh {
            for &unit in &ctx.sphere {
                emit(buffer, self.centre + unit * self.radius, unit, colour)?;
            }
            return Ok(());
        }

        let radius = if self.state.format == ctx.formats.balls_and_sticks {
            self.radius * ctx.ball_and_stick_scale
        } else {
            self.radius
        };
        for [x, y] in BILLBOARD_CORNERS {
            emit(buffer, self.centre, Vec3::new(x, y, radius), colour)?;
        }
        Ok(())
    }

    fn shading(ctx: &AtomContext, format: Token) -> ShadingStyle {
        if format == ctx.formats.sphere_mesh {
            ShadingStyle::Mesh
        } else {
            ShadingStyle::Billboard
        }
    }
}

/// Owns every atom renderable and the atom buffer pool.
pub struct AtomManager {
    store: RenderableStore<AtomRenderable>,
    ctx: AtomContext,
}

impl AtomManager {
    /// Empty manager drawing from `pool`.
    pub fn new(registry: &mut TokenRegistry, pool: BufferPool, geometry: &GeometryOptions) -> Self {
        let formats = AtomFormats::register(registry);
        Self {
            store: RenderableStore::new(PoolId::Atoms, pool),
            ctx: AtomContext::new(formats, geometry),
        }
    }

    /// Create the renderable for `record` with pick `name`. Returns the
    /// existing handle if the atom already has one.
    pub fn create(&mut self, record: &AtomRecord, colours: &ColourMap, name: u32) -> RenderableHandle {
        if let Some(handle) = self.store.lookup(record.id) {
            return handle;
        }
        let colour = colours.get_or_default(&element_key(&record.element));
        let mut state = RenderState::new(self.ctx.formats.spacefill, colour, ATOM_ALPHA);
        state.name = name;
        self.store.insert(
            record.id,
            AtomRenderable::new(state, record.position, record.radius),
        )
    }

    /// Destroy a renderable. Returns `false` for a stale handle.
    pub fn destroy(&mut self, handle: RenderableHandle) -> bool {
        self.store.remove(handle).is_some()
    }

    /// Handle for `object`.
    #[must_use]
    pub fn lookup(&self, object: ObjectId) -> Option<RenderableHandle> {
        self.store.lookup(object)
    }

    /// Apply `command` to one atom. Formats this manager does not draw are
    /// ignored.
    pub fn apply(&mut self, handle: RenderableHandle, command: &Command) -> Change {
        if command
            .render_format()
            .is_some_and(|format| !self.ctx.formats.all().contains(&format))
        {
            return Change::Unchanged;
        }
        self.store.apply(handle, command, &self.ctx)
    }

    /// Rebuild if stale and queue uploads.
    pub fn prepare(&mut self) -> RebuildStats {
        self.store.prepare(&self.ctx)
    }

    /// Append draws for `pass`.
    pub fn draw(&self, pass: RenderPass, out: &mut DrawList) {
        self.store.draw(pass, &self.ctx, out);
    }

    /// Change sphere tessellation for geometry written from now on.
    pub fn set_level_of_detail(&mut self, lod: u32) {
        let lod = lod.clamp(MIN_ATOM_LOD, MAX_ATOM_LOD);
        if lod != self.ctx.lod {
            self.ctx.lod = lod;
            self.ctx.sphere = sphere_strip(lod);
        }
    }

    /// Current tessellation level.
    #[must_use]
    pub fn level_of_detail(&self) -> u32 {
        self.ctx.lod
    }

    /// Formats this manager draws.
    #[must_use]
    pub fn render_formats(&self) -> Vec<Token> {
        self.ctx.formats.all().to_vec()
    }

    /// Options this manager reads. Atoms have none.
    #[must_use]
    pub fn render_options(&self) -> Vec<Token> {
        Vec::new()
    }

    /// Writer context.
    #[must_use]
    pub fn context(&self) -> &AtomContext {
        &self.ctx
    }

    /// Renderable store.
    #[must_use]
    pub fn store(&self) -> &RenderableStore<AtomRenderable> {
        &self.store
    }

    /// Mutable renderable store, for draining uploads.
    pub fn store_mut(&mut self) -> &mut RenderableStore<AtomRenderable> {
        &mut self.store
    }

    /// Drop every atom and buffer.
    pub fn clear(&mut self) {
        self.store.clear();
    }
}
