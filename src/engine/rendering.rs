//! Frame preparation, draw lists and global render switches.

use super::MolecularScene;
use crate::gpu::dynamic_buffer::{GpuVertexStore, SyncStats};
use crate::renderable::store::RebuildStats;
use crate::renderer::draw_list::DrawList;
use crate::renderer::pass::RenderPass;
use crate::renderer::scheduler::PassOutput;

impl MolecularScene {
    /// Rebuild stale buffers. Runs after the frame's commands and before
    /// its first pass; the draw methods call it themselves.
    pub fn prepare(&mut self) -> RebuildStats {
        let stats = self.scheduler.prepare(&mut [&mut self.chains, &mut self.atoms]);
        if stats.populated > 0 || stats.swept > 0 {
            log::debug!(
                "rebuild: {} populated, {} released, {} buffers swept",
                stats.populated,
                stats.released,
                stats.swept
            );
        }
        stats
    }

    /// Draws eligible for `pass`, chains first.
    pub fn render_pass(&mut self, pass: RenderPass) -> DrawList {
        let _ = self.prepare();
        self.scheduler.render_pass(pass, &[&self.chains, &self.atoms])
    }

    /// Every pass of one frame in sequence order.
    pub fn render_frame(&mut self) -> Vec<PassOutput> {
        let _ = self.prepare();
        self.scheduler.render_frame(&[&self.chains, &self.atoms])
    }

    /// The on-demand pick pass.
    pub fn render_pick(&mut self) -> PassOutput {
        let draws = self.render_pass(RenderPass::Pick);
        PassOutput {
            pass: RenderPass::Pick,
            state: self.scheduler.pass_state(RenderPass::Pick),
            draws,
        }
    }

    /// Tessellation for geometry written from now on. Each manager clamps
    /// to its own range; existing geometry is kept.
    pub fn set_level_of_detail(&mut self, lod: u32) {
        self.chains.set_level_of_detail(lod);
        self.atoms.set_level_of_detail(lod);
    }

    /// Whether the Draw pass adds a specular term.
    #[must_use]
    pub fn specular(&self) -> bool {
        self.scheduler.specular()
    }

    /// Toggle the specular term.
    pub fn set_specular(&mut self, enabled: bool) {
        self.scheduler.set_specular(enabled);
    }

    /// Whether the Shadow pass draws.
    #[must_use]
    pub fn shadows(&self) -> bool {
        self.scheduler.shadows()
    }

    /// Toggle the Shadow pass.
    pub fn set_shadows(&mut self, enabled: bool) {
        self.scheduler.set_shadows(enabled);
    }

    /// Mirror both buffer pools into `store`.
    pub fn sync_gpu(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        store: &mut GpuVertexStore,
    ) -> SyncStats {
        let residues = self.chains.residues_mut();
        let pool_id = residues.pool_id();
        let chains = store.sync(device, queue, pool_id, residues.pool_mut());

        let atoms = self.atoms.store_mut();
        let pool_id = atoms.pool_id();
        let atoms = store.sync(device, queue, pool_id, atoms.pool_mut());

        SyncStats {
            created: chains.created + atoms.created,
            dropped: chains.dropped + atoms.dropped,
            uploads: chains.uploads + atoms.uploads,
            bytes: chains.bytes + atoms.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::colour::Colour;
    use crate::engine::selection::{NamedSelection, Selection};
    use crate::options::{Options, MAX_ATOM_LOD, MAX_CHAIN_LOD};
    use crate::renderer::draw_list::PoolId;
    use crate::renderer::molecular::atom::sphere_vertex_count;
    use crate::renderer::pass::{RenderTag, FRAME_SEQUENCE};
    use crate::scene::{AtomRecord, ChainRecord, MemorySource, ObjectId, ResidueRecord, SSType};

    fn scene() -> MolecularScene {
        let mut source = MemorySource::new();
        source.push_chain(ChainRecord {
            id: ObjectId(1),
            residues: (0..3)
                .map(|i| ResidueRecord::trace(ObjectId(10 + i), "ALA", Vec3::X * 3.8 * i as f32, SSType::Helix))
                .collect(),
        });
        for i in 0..4 {
            source.push_atom(AtomRecord::new(ObjectId(100 + i), "C", Vec3::Y * i as f32, 1.7));
        }
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let _ = scene.load(&source);
        scene
    }

    #[test]
    fn frame_covers_the_sequence_and_draws_chains_first() {
        let mut scene = scene();
        let frame = scene.render_frame();
        assert_eq!(frame.iter().map(|o| o.pass).collect::<Vec<_>>(), FRAME_SEQUENCE.to_vec());

        let draw = &frame[2];
        assert_eq!(draw.pass, RenderPass::Draw);
        let pools: Vec<PoolId> = draw.draws.calls().iter().map(|call| call.pool).collect();
        assert_eq!(pools.first(), Some(&PoolId::Residues));
        assert_eq!(pools.last(), Some(&PoolId::Atoms));
        assert_eq!(
            draw.draws.vertex_count(),
            scene.atoms().store().occupied_vertices() + scene.chains().residues().occupied_vertices()
        );
    }

    #[test]
    fn render_pass_prepares_stale_stores() {
        let mut scene = scene();
        assert!(scene.atoms().store().is_stale());
        let draws = scene.render_pass(RenderPass::Draw);
        assert!(!scene.atoms().store().is_stale());
        assert!(!draws.is_empty());
        assert_eq!(scene.prepare(), RebuildStats::default());
    }

    #[test]
    fn shadow_pass_follows_the_switch() {
        let mut scene = scene();
        let _ = scene.set_tag(&NamedSelection::All.into(), RenderTag::Outline);
        scene.set_shadows(false);
        assert!(scene.render_pass(RenderPass::Shadow).is_empty());
        scene.set_shadows(true);
        assert!(scene.shadows());
        // one draw per residue plus one per atom
        assert_eq!(scene.render_pass(RenderPass::Shadow).len(), 7);
    }

    #[test]
    fn pick_draws_carry_names() {
        let mut scene = scene();
        let pick = scene.render_pick();
        assert_eq!(pick.pass, RenderPass::Pick);
        assert_eq!(pick.draws.len(), 7);
        for call in pick.draws.calls() {
            assert!(scene.resolve_pick(call.instance_value()).is_some());
        }
    }

    #[test]
    fn outline_highlight_reaches_only_draw_outline() {
        let mut scene = scene();
        let atom: Selection = [ObjectId(100)].into_iter().collect();
        let _ = scene.set_tag(&atom, RenderTag::Outline);
        let _ = scene.set_highlight_colour(&atom, Some(Colour::new(255, 0, 0)));
        let outline = scene.render_pass(RenderPass::DrawOutline);
        assert_eq!(outline.len(), 1);
        assert_eq!(outline.calls()[0].instance_value(), 0x0100_00FF);
        assert!(scene
            .render_pass(RenderPass::Draw)
            .calls()
            .iter()
            .all(|call| call.instance_value() == 0));
    }

    #[test]
    fn level_of_detail_is_clamped_per_manager() {
        let mut scene = scene();
        scene.set_level_of_detail(6);
        assert_eq!(scene.atoms().level_of_detail(), 6);
        assert_eq!(scene.chains().level_of_detail(), 10);
        let mesh = scene.render_format(crate::renderer::molecular::atom::SPHERE_MESH).unwrap();
        let _ = scene.set_render_format(&NamedSelection::Atoms.into(), mesh);
        let _ = scene.prepare();
        assert_eq!(
            scene.atoms().store().occupied_vertices(),
            4 * u64::from(sphere_vertex_count(6))
        );
    }

    #[test]
    fn huge_level_of_detail_is_capped() {
        let mut scene = scene();
        scene.set_level_of_detail(70_000);
        assert_eq!(scene.atoms().level_of_detail(), MAX_ATOM_LOD);
        assert_eq!(scene.chains().level_of_detail(), MAX_CHAIN_LOD);
        let mesh = scene.render_format(crate::renderer::molecular::atom::SPHERE_MESH).unwrap();
        let _ = scene.set_render_format(&NamedSelection::Atoms.into(), mesh);
        let _ = scene.prepare();
        assert_eq!(
            scene.atoms().store().occupied_vertices(),
            4 * u64::from(sphere_vertex_count(MAX_ATOM_LOD))
        );
    }

    #[test]
    fn specular_switch_changes_draw_state() {
        let mut scene = scene();
        scene.set_specular(false);
        assert!(!scene.specular());
        let unlit = scene.render_frame()[2].state;
        scene.set_specular(true);
        let lit = scene.render_frame()[2].state;
        assert_ne!(unlit, lit);
    }
}
