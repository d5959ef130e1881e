//! Selection commands.
//!
//! Object identities form one namespace across the scene, so each identity
//! in a selection reaches at most one renderable: the atom manager is asked
//! first, then the chain manager (chains and their residues). Identities
//! nobody renders are skipped.

use super::command::Command;
use super::selection::Selection;
use super::MolecularScene;
use crate::colour::Colour;
use crate::registry::Token;
use crate::renderable::Change;
use crate::renderer::molecular::{AtomManager, ChainManager};
use crate::renderer::pass::RenderTag;
use crate::scene::ObjectId;

fn route(atoms: &mut AtomManager, chains: &mut ChainManager, id: ObjectId, command: &Command) -> bool {
    if let Some(handle) = atoms.lookup(id) {
        let _ = atoms.apply(handle, command);
        return true;
    }
    if let Some(target) = chains.lookup(id) {
        let change = chains.apply(target, command);
        if change == Change::Placement {
            log::trace!("{id:?} relocates after {command:?}");
        }
        return true;
    }
    false
}

impl MolecularScene {
    /// Apply `command` to every renderable in `selection`. Returns how many
    /// renderables the selection reached.
    pub fn apply(&mut self, selection: &Selection, command: &Command) -> usize {
        let Self {
            atoms,
            chains,
            selections,
            ..
        } = self;
        let mut reached = 0;
        let mut skipped = 0;
        let mut visit = |id: ObjectId| {
            if route(atoms, chains, id, command) {
                reached += 1;
            } else {
                skipped += 1;
            }
        };
        match selection {
            Selection::Named(name) => selections.members(*name).for_each(&mut visit),
            Selection::Custom(ids) => ids.iter().copied().for_each(&mut visit),
        }
        if skipped > 0 {
            log::trace!("{command:?}: {skipped} identities without a renderable");
        }
        reached
    }

    /// Set the host display flag.
    pub fn set_display(&mut self, selection: &Selection, display: bool) -> usize {
        self.apply(selection, &Command::SetDisplay(display))
    }

    /// Set the visibility flag.
    pub fn set_visible(&mut self, selection: &Selection, visible: bool) -> usize {
        self.apply(selection, &Command::SetVisible(visible))
    }

    /// Switch render format. Renderables whose manager does not draw
    /// `format` keep their current one.
    pub fn set_render_format(&mut self, selection: &Selection, format: Token) -> usize {
        self.apply(selection, &Command::SetRenderFormat(format))
    }

    /// Enable or disable a render option.
    pub fn set_render_option(&mut self, selection: &Selection, option: Token, enabled: bool) -> usize {
        self.apply(selection, &Command::SetRenderOption(option, enabled))
    }

    /// Set the material colour.
    pub fn set_colour(&mut self, selection: &Selection, colour: Colour) -> usize {
        self.apply(selection, &Command::SetColour(colour))
    }

    /// Set the material alpha.
    pub fn set_alpha(&mut self, selection: &Selection, alpha: u8) -> usize {
        self.apply(selection, &Command::SetAlpha(alpha))
    }

    /// Set or clear the tint colour.
    pub fn set_tint_colour(&mut self, selection: &Selection, tint: Option<Colour>) -> usize {
        self.apply(selection, &Command::SetTintColour(tint))
    }

    /// Set or clear the outline highlight colour.
    pub fn set_highlight_colour(&mut self, selection: &Selection, colour: Option<Colour>) -> usize {
        self.apply(selection, &Command::SetHighlightColour(colour))
    }

    /// Move renderables to another pass tag.
    pub fn set_tag(&mut self, selection: &Selection, tag: RenderTag) -> usize {
        self.apply(selection, &Command::SetTag(tag))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::engine::selection::NamedSelection;
    use crate::options::Options;
    use crate::renderable::Renderable;
    use crate::renderer::molecular::atom::SPHERE_MESH;
    use crate::renderer::molecular::chain::{CARTOON, SMOOTH_BACKBONES};
    use crate::scene::{AtomRecord, ChainRecord, MemorySource, ResidueRecord, SSType};

    fn scene() -> MolecularScene {
        let mut source = MemorySource::new();
        source.push_chain(ChainRecord {
            id: ObjectId(1),
            residues: (0..3)
                .map(|i| ResidueRecord::trace(ObjectId(10 + i), "GLY", Vec3::X * 3.8 * i as f32, SSType::Coil))
                .collect(),
        });
        source.push_atom(AtomRecord::new(ObjectId(100), "C", Vec3::ZERO, 1.7));
        source.push_atom(AtomRecord::new(ObjectId(101), "H", Vec3::Y, 1.1));
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let _ = scene.load(&source);
        let _ = scene.prepare();
        scene
    }

    fn atom_state(scene: &MolecularScene, id: u64) -> crate::renderable::RenderState {
        let handle = scene.atoms().lookup(ObjectId(id)).unwrap();
        scene.atoms().store().get(handle).unwrap().state().clone()
    }

    #[test]
    fn unknown_identities_are_skipped() {
        let mut scene = scene();
        let selection: Selection = [ObjectId(100), ObjectId(7), ObjectId(8)].into_iter().collect();
        assert_eq!(scene.set_visible(&selection, false), 1);
        assert!(!atom_state(&scene, 100).visible);
    }

    #[test]
    fn shared_identity_reaches_one_renderable() {
        let mut source = MemorySource::new();
        source.push_chain(ChainRecord {
            id: ObjectId(1),
            residues: (0..2)
                .map(|i| ResidueRecord::trace(ObjectId(10 + i), "GLY", Vec3::X * 3.8 * i as f32, SSType::Coil))
                .collect(),
        });
        source.push_atom(AtomRecord::new(ObjectId(10), "C", Vec3::ZERO, 1.7));
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let _ = scene.load(&source);
        assert!(scene.atoms().lookup(ObjectId(10)).is_none());

        let one: Selection = [ObjectId(10)].into_iter().collect();
        assert_eq!(scene.set_alpha(&one, 33), 1);
        let residues = scene.chains().residues();
        let residue = residues.lookup(ObjectId(10)).unwrap();
        assert_eq!(residues.get(residue).unwrap().state().alpha, 33);
    }

    #[test]
    fn named_selection_reaches_atoms_and_chains() {
        let mut scene = scene();
        // two atoms + one chain
        assert_eq!(scene.set_alpha(&NamedSelection::All.into(), 200), 3);
        assert_eq!(atom_state(&scene, 101).alpha, 200);
        assert!(scene
            .chains()
            .residues()
            .iter()
            .all(|(_, _, residue)| residue.state().alpha == 200));
    }

    #[test]
    fn hiding_makes_the_store_stale_and_colouring_does_not() {
        let mut scene = scene();
        let hydrogens = Selection::from(NamedSelection::Hydrogens);
        assert_eq!(scene.set_colour(&hydrogens, Colour::new(1, 2, 3)), 1);
        assert!(!scene.atoms().store().is_stale());

        assert_eq!(scene.set_visible(&hydrogens, false), 1);
        assert!(scene.atoms().store().is_stale());
        let _ = scene.prepare();
        let hidden = scene.atoms().lookup(ObjectId(101)).unwrap();
        assert_eq!(scene.atoms().store().occupancy(hidden), None);
    }

    #[test]
    fn formats_only_reach_managers_that_draw_them() {
        let mut scene = scene();
        let all = Selection::from(NamedSelection::All);
        let cartoon = scene.render_format(CARTOON).unwrap();
        let _ = scene.set_render_format(&all, cartoon);
        assert_ne!(atom_state(&scene, 100).format, cartoon);
        assert!(scene
            .chains()
            .residues()
            .iter()
            .all(|(_, _, residue)| residue.state().format == cartoon));

        let mesh = scene.render_format(SPHERE_MESH).unwrap();
        let _ = scene.set_render_format(&all, mesh);
        assert_eq!(atom_state(&scene, 100).format, mesh);
        assert!(scene
            .chains()
            .residues()
            .iter()
            .all(|(_, _, residue)| residue.state().format == cartoon));
    }

    #[test]
    fn options_tags_and_highlights_are_recorded() {
        let mut scene = scene();
        let chains = Selection::from(NamedSelection::Chains);
        let smooth = scene.render_option(SMOOTH_BACKBONES).unwrap();
        let _ = scene.set_render_option(&chains, smooth, false);
        assert!(scene
            .chains()
            .residues()
            .iter()
            .all(|(_, _, residue)| !residue.state().has_option(smooth)));

        let atoms = Selection::from(NamedSelection::Atoms);
        let _ = scene.set_tag(&atoms, RenderTag::Outline);
        let _ = scene.set_highlight_colour(&atoms, Some(Colour::new(255, 255, 0)));
        let _ = scene.set_tint_colour(&atoms, Some(Colour::new(0, 0, 255)));
        let _ = scene.set_display(&atoms, true);
        let state = atom_state(&scene, 100);
        assert_eq!(state.tag, RenderTag::Outline);
        assert_eq!(state.highlight, Some(Colour::new(255, 255, 0)));
        assert_eq!(state.tint, Some(Colour::new(0, 0, 255)));
        assert!(state.display);
    }
}
