//! Renderable managers for atoms and chains.

pub mod atom;
pub mod backbone;
pub mod chain;

use crate::registry::Token;
use crate::renderable::store::RebuildStats;
use crate::renderer::draw_list::DrawList;
use crate::renderer::pass::RenderPass;

pub use atom::AtomManager;
pub use chain::ChainManager;

/// Trait shared by the renderable managers.
///
/// The pass scheduler prepares every manager once per frame, then asks
/// each one for its draws pass by pass, in a fixed manager order.
pub trait RenderableManager {
    /// Rebuild stale buffers and queue uploads.
    fn prepare(&mut self) -> RebuildStats;

    /// Append draws eligible for `pass`.
    fn draw(&self, pass: RenderPass, out: &mut DrawList);

    /// Change tessellation for geometry written from now on.
    fn set_level_of_detail(&mut self, lod: u32);

    /// Formats the manager draws.
    fn render_formats(&self) -> Vec<Token>;

    /// Options the manager reads.
    fn render_options(&self) -> Vec<Token>;
}

impl RenderableManager for AtomManager {
    fn prepare(&mut self) -> RebuildStats {
        Self::prepare(self)
    }

    fn draw(&self, pass: RenderPass, out: &mut DrawList) {
        Self::draw(self, pass, out);
    }

    fn set_level_of_detail(&mut self, lod: u32) {
        Self::set_level_of_detail(self, lod);
    }

    fn render_formats(&self) -> Vec<Token> {
        Self::render_formats(self)
    }

    fn render_options(&self) -> Vec<Token> {
        Self::render_options(self)
    }
}

impl RenderableManager for ChainManager {
    fn prepare(&mut self) -> RebuildStats {
        Self::prepare(self)
    }

    fn draw(&self, pass: RenderPass, out: &mut DrawList) {
        Self::draw(self, pass, out);
    }

    fn set_level_of_detail(&mut self, lod: u32) {
        Self::set_level_of_detail(self, lod);
    }

    fn render_formats(&self) -> Vec<Token> {
        Self::render_formats(self)
    }

    fn render_options(&self) -> Vec<Token> {
        Self::render_options(self)
    }
}
