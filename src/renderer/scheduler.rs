//! Per-frame pass driver.
//!
//! The scheduler owns the two global render switches, rebuilds every
//! manager before the first pass, then walks [`FRAME_SEQUENCE`] asking
//! each manager, in order, for the draws eligible in that pass.

use super::draw_list::DrawList;
use super::molecular::RenderableManager;
use super::pass::{PassState, RenderPass, FRAME_SEQUENCE};
use crate::options::RenderOptions;
use crate::renderable::store::RebuildStats;

/// Draws and pipeline configuration of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutput {
    /// The pass.
    pub pass: RenderPass,
    /// Pipeline configuration to bind.
    pub state: PassState,
    /// Draw calls in submission order.
    pub draws: DrawList,
}

/// Drives the fixed pass sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassScheduler {
    specular: bool,
    shadows: bool,
}

impl PassScheduler {
    /// Scheduler with the switches from `options`.
    #[must_use]
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            specular: options.specular,
            shadows: options.shadows,
        }
    }

    /// Whether the Draw pass adds a specular term.
    #[must_use]
    pub fn specular(&self) -> bool {
        self.specular
    }

    /// Whether the Shadow pass draws anything.
    #[must_use]
    pub fn shadows(&self) -> bool {
        self.shadows
    }

    /// Toggle the specular term.
    pub fn set_specular(&mut self, enabled: bool) {
        self.specular = enabled;
    }

    /// Toggle the shadow pass.
    pub fn set_shadows(&mut self, enabled: bool) {
        self.shadows = enabled;
    }

    /// Pipeline configuration for `pass` under the current switches.
    #[must_use]
    pub fn pass_state(&self, pass: RenderPass) -> PassState {
        pass.state(self.specular)
    }

    /// Rebuild every stale manager. Must run after the frame's commands
    /// and before its first pass.
    pub fn prepare(&self, managers: &mut [&mut dyn RenderableManager]) -> RebuildStats {
        managers
            .iter_mut()
            .map(|manager| manager.prepare())
            .fold(RebuildStats::default(), |total, stats| RebuildStats {
                released: total.released + stats.released,
                swept: total.swept + stats.swept,
                populated: total.populated + stats.populated,
            })
    }

    /// Draws for one pass from every manager, in manager order.
    #[must_use]
    pub fn render_pass(&self, pass: RenderPass, managers: &[&dyn RenderableManager]) -> DrawList {
        let mut draws = DrawList::new();
        if pass == RenderPass::Shadow && !self.shadows {
            return draws;
        }
        for manager in managers {
            manager.draw(pass, &mut draws);
        }
        draws
    }

    /// Every pass of [`FRAME_SEQUENCE`].
    #[must_use]
    pub fn render_frame(&self, managers: &[&dyn RenderableManager]) -> Vec<PassOutput> {
        FRAME_SEQUENCE
            .iter()
            .map(|&pass| PassOutput {
                pass,
                state: self.pass_state(pass),
                draws: self.render_pass(pass, managers),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::colour::ColourMap;
    use crate::engine::command::Command;
    use crate::gpu::buffer_pool::BufferPool;
    use crate::gpu::vertex_format::VertexFormat;
    use crate::options::GeometryOptions;
    use crate::registry::TokenRegistry;
    use crate::renderer::draw_list::PoolId;
    use crate::renderer::molecular::chain::ChainTarget;
    use crate::renderer::molecular::{AtomManager, ChainManager};
    use crate::renderer::pass::RenderTag;
    use crate::scene::{AtomRecord, ChainRecord, ObjectId, ResidueRecord, SSType};

    fn managers() -> (ChainManager, AtomManager) {
        let mut registry = TokenRegistry::new();
        let geometry = GeometryOptions::default();
        let pool = || BufferPool::new(VertexFormat::default(), 1 << 16);
        let mut chains = ChainManager::new(&mut registry, pool(), &geometry);
        let mut atoms = AtomManager::new(&mut registry, pool(), &geometry);
        let colours = ColourMap::builtin();
        let record = ChainRecord {
            id: ObjectId(1),
            residues: (0..3)
                .map(|i| {
                    ResidueRecord::trace(
                        ObjectId(10 + i),
                        "ALA",
                        Vec3::X * 3.8 * i as f32,
                        SSType::Coil,
                    )
                })
                .collect(),
        };
        let chain = chains.create(&record, &colours, |_| 0);
        let _ = chains.apply(ChainTarget::Chain(chain), &Command::SetTag(RenderTag::Outline));
        for i in 0..4 {
            let _ = atoms.create(
                &AtomRecord::new(ObjectId(100 + i), "C", Vec3::Y * i as f32, 1.7),
                &colours,
                0,
            );
        }
        (chains, atoms)
    }

    #[test]
    fn prepare_sums_every_manager() {
        let (mut chains, mut atoms) = managers();
        let scheduler = PassScheduler::new(&RenderOptions::default());
        let stats = scheduler.prepare(&mut [&mut chains, &mut atoms]);
        assert_eq!(stats.populated, 3 + 4);
    }

    #[test]
    fn chains_draw_before_atoms() {
        let (mut chains, mut atoms) = managers();
        let scheduler = PassScheduler::new(&RenderOptions::default());
        let _ = scheduler.prepare(&mut [&mut chains, &mut atoms]);
        let draws = scheduler.render_pass(RenderPass::Draw, &[&chains, &atoms]);
        let pools: Vec<PoolId> = draws.calls().iter().map(|c| c.pool).collect();
        assert_eq!(pools, vec![PoolId::Residues, PoolId::Atoms]);
    }

    #[test]
    fn shadow_pass_needs_shadows_enabled() {
        let (mut chains, mut atoms) = managers();
        let mut scheduler = PassScheduler::new(&RenderOptions::default());
        let _ = scheduler.prepare(&mut [&mut chains, &mut atoms]);
        assert!(scheduler.render_pass(RenderPass::Shadow, &[&chains, &atoms]).is_empty());
        scheduler.set_shadows(true);
        let shadow = scheduler.render_pass(RenderPass::Shadow, &[&chains, &atoms]);
        assert_eq!(shadow.len(), 3);
        assert_eq!(shadow, scheduler.render_pass(RenderPass::Stencil, &[&chains, &atoms]));
    }

    #[test]
    fn frame_runs_the_fixed_sequence() {
        let (mut chains, mut atoms) = managers();
        let scheduler = PassScheduler::new(&RenderOptions::default());
        let _ = scheduler.prepare(&mut [&mut chains, &mut atoms]);
        let frame = scheduler.render_frame(&[&chains, &atoms]);
        let passes: Vec<RenderPass> = frame.iter().map(|p| p.pass).collect();
        assert_eq!(passes, FRAME_SEQUENCE.to_vec());
        // outlined residues show up in the transparent prepass too
        let depth_transparent = &frame[5].draws;
        assert_eq!(depth_transparent.len(), 1);
        assert_eq!(frame[7].draws.len(), 3);
        assert!(frame[2].state.specular);
    }
}
