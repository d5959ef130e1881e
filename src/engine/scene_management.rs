//! Creating, finding and destroying renderables.

use super::selection::SelectionSets;
use super::{MolecularScene, RenderableRef};
use crate::renderer::molecular::chain::ChainTarget;
use crate::scene::{ObjectId, ObjectSource, SceneBounds};

/// Renderables created by [`MolecularScene::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Atom renderables.
    pub atoms: usize,
    /// Chain renderables.
    pub chains: usize,
    /// Residue renderables across all chains.
    pub residues: usize,
}

impl MolecularScene {
    /// Replace the scene with every chain and atom in `source`, compute
    /// the bounding sphere and rebuild the named selections.
    pub fn load(&mut self, source: &dyn ObjectSource) -> LoadStats {
        self.clear_all();
        let mut stats = LoadStats::default();
        for chain in source.chains() {
            if self.create_renderable(source, chain.id).is_some() {
                stats.chains += 1;
            }
        }
        stats.residues = self.chains.residues().len();
        for atom in source.atoms() {
            if self.create_renderable(source, atom.id).is_some() {
                stats.atoms += 1;
            }
        }
        self.bounds = SceneBounds::from_points(source.atoms().iter().map(|atom| atom.position));
        self.selections = SelectionSets::from_source(source);
        log::info!(
            "loaded scene: {} atoms, {} chains, {} residues",
            stats.atoms,
            stats.chains,
            stats.residues
        );
        stats
    }

    /// Create the renderable for `id`, looking its record up in `source`.
    /// Returns the existing renderable if there is one, `None` if `source`
    /// has no atom or chain called `id`.
    pub fn create_renderable(
        &mut self,
        source: &dyn ObjectSource,
        id: ObjectId,
    ) -> Option<RenderableRef> {
        if let Some(existing) = self.lookup(id) {
            return Some(existing);
        }
        if let Some(record) = source.atom(id) {
            let name = self.picks.assign(id);
            let handle = self.atoms.create(record, &self.env.colours, name);
            return Some(RenderableRef::Atom(handle));
        }
        if let Some(record) = source.chain(id) {
            let picks = &mut self.picks;
            let handle = self
                .chains
                .create(record, &self.env.colours, |residue| picks.assign(residue));
            return Some(RenderableRef::Chain(handle));
        }
        log::trace!("no record for {id:?}");
        None
    }

    /// Destroy a renderable and release its geometry. Destroying a chain
    /// destroys its residues. Returns `false` for a stale handle.
    pub fn destroy_renderable(&mut self, renderable: RenderableRef) -> bool {
        match renderable {
            RenderableRef::Atom(handle) => self.atoms.destroy(handle),
            RenderableRef::Chain(handle) => self.chains.destroy(handle),
            RenderableRef::Residue(handle) => self.chains.destroy_residue(handle),
        }
    }

    /// Renderable for `id`, if one exists.
    #[must_use]
    pub fn lookup(&self, id: ObjectId) -> Option<RenderableRef> {
        if let Some(handle) = self.atoms.lookup(id) {
            return Some(RenderableRef::Atom(handle));
        }
        self.chains.lookup(id).map(|target| match target {
            ChainTarget::Chain(handle) => RenderableRef::Chain(handle),
            ChainTarget::Residue(handle) => RenderableRef::Residue(handle),
        })
    }

    /// Destroy every renderable, buffer, pick name and selection.
    pub fn clear_all(&mut self) {
        self.chains.clear();
        self.atoms.clear();
        self.picks.clear();
        self.selections.clear();
        self.bounds = None;
    }

    /// Object under a raw pick value.
    #[must_use]
    pub fn resolve_pick(&self, raw: u32) -> Option<ObjectId> {
        self.picks.resolve(raw)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::options::Options;
    use crate::scene::{AtomRecord, ChainRecord, MemorySource, ResidueRecord, SSType};

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.push_chain(ChainRecord {
            id: ObjectId(1),
            residues: (0..4)
                .map(|i| {
                    ResidueRecord::trace(ObjectId(10 + i), "ALA", Vec3::X * 3.8 * i as f32, SSType::Helix)
                })
                .collect(),
        });
        source.push_atom(AtomRecord::new(ObjectId(100), "C", Vec3::new(-2.0, 0.0, 0.0), 1.7));
        source.push_atom(AtomRecord::new(ObjectId(101), "O", Vec3::new(2.0, 0.0, 0.0), 1.5));
        source
    }

    #[test]
    fn load_creates_everything_and_frames_atoms() {
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let stats = scene.load(&source());
        assert_eq!(
            stats,
            LoadStats {
                atoms: 2,
                chains: 1,
                residues: 4
            }
        );
        let bounds = scene.bounds().unwrap();
        assert_eq!(bounds.centre, Vec3::ZERO);
        // diagonal 4 / 2 + no centre offset + 2 margin
        assert!((bounds.radius - 4.0).abs() < 1e-5);
    }

    #[test]
    fn lookup_distinguishes_kinds() {
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let _ = scene.load(&source());
        assert!(matches!(scene.lookup(ObjectId(100)), Some(RenderableRef::Atom(_))));
        assert!(matches!(scene.lookup(ObjectId(1)), Some(RenderableRef::Chain(_))));
        assert!(matches!(scene.lookup(ObjectId(12)), Some(RenderableRef::Residue(_))));
        assert_eq!(scene.lookup(ObjectId(999)), None);
    }

    #[test]
    fn create_is_idempotent_and_skips_unknown_ids() {
        let source = source();
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let first = scene.create_renderable(&source, ObjectId(100));
        assert_eq!(scene.create_renderable(&source, ObjectId(100)), first);
        assert_eq!(scene.create_renderable(&source, ObjectId(5)), None);
        assert_eq!(scene.atoms().store().len(), 1);
    }

    #[test]
    fn pick_names_resolve_to_residues_and_atoms() {
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let _ = scene.load(&source());
        // residues are named first, then atoms
        assert_eq!(scene.resolve_pick(1), Some(ObjectId(10)));
        assert_eq!(scene.resolve_pick(5), Some(ObjectId(100)));
        assert_eq!(scene.resolve_pick(0), None);
    }

    #[test]
    fn destroying_a_chain_takes_its_residues() {
        let mut scene = MolecularScene::new(&Options::default()).unwrap();
        let _ = scene.load(&source());
        let chain = scene.lookup(ObjectId(1)).unwrap();
        assert!(scene.destroy_renderable(chain));
        assert!(!scene.destroy_renderable(chain));
        assert!(scene.chains().residues().is_empty());
        assert_eq!(scene.lookup(ObjectId(11)), None);

        let atom = scene.lookup(ObjectId(100)).unwrap();
        assert!(scene.destroy_renderable(atom));
        scene.clear_all();
        assert!(scene.picks().is_empty());
        assert!(scene.bounds().is_none());
    }
}
