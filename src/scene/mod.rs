//! Object records supplied by the host application.
//!
//! The renderer never owns molecular data. It asks an [`ObjectSource`]
//! for atom and chain records by opaque [`ObjectId`] when renderables are
//! created. [`MemorySource`] is a plain in-memory source.

mod bounds;

pub use bounds::SceneBounds;
use glam::Vec3;
use rustc_hash::FxHashMap;

/// Opaque identity of an external object (atom, residue or chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Secondary structure classification of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SSType {
    /// Alpha helix.
    Helix,
    /// Beta strand.
    Sheet,
    /// Anything else.
    #[default]
    Coil,
}

/// One atom.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Identity.
    pub id: ObjectId,
    /// Element symbol, e.g. `"C"` or `"Fe"`.
    pub element: String,
    /// Centre in angstroms.
    pub position: Vec3,
    /// Display radius in angstroms.
    pub radius: f32,
    /// Name of the residue the atom belongs to, if any.
    pub residue_name: Option<String>,
    /// Whether the atom is a heterogen (ligand, ion, water).
    pub hetero: bool,
}

impl AtomRecord {
    /// Atom with no residue context.
    #[must_use]
    pub fn new(id: ObjectId, element: &str, position: Vec3, radius: f32) -> Self {
        Self {
            id,
            element: element.to_owned(),
            position,
            radius,
            residue_name: None,
            hetero: false,
        }
    }
}

/// One residue of a chain, reduced to its backbone atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueRecord {
    /// Identity.
    pub id: ObjectId,
    /// Three-letter residue name.
    pub name: String,
    /// Alpha carbon.
    pub ca: Option<Vec3>,
    /// Backbone amide nitrogen.
    pub n: Option<Vec3>,
    /// Backbone carbonyl carbon.
    pub c: Option<Vec3>,
    /// Secondary structure classification.
    pub ss: SSType,
}

impl ResidueRecord {
    /// Residue with only an alpha carbon.
    #[must_use]
    pub fn trace(id: ObjectId, name: &str, ca: Vec3, ss: SSType) -> Self {
        Self {
            id,
            name: name.to_owned(),
            ca: Some(ca),
            n: None,
            c: None,
            ss,
        }
    }
}

/// An ordered chain of residues.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRecord {
    /// Identity.
    pub id: ObjectId,
    /// Residues in sequence order.
    pub residues: Vec<ResidueRecord>,
}

/// Supplies records for object identities.
pub trait ObjectSource {
    /// Atom record for `id`, if `id` names an atom.
    fn atom(&self, id: ObjectId) -> Option<&AtomRecord>;
    /// Chain record for `id`, if `id` names a chain.
    fn chain(&self, id: ObjectId) -> Option<&ChainRecord>;
    /// Every atom.
    fn atoms(&self) -> Vec<&AtomRecord>;
    /// Every chain.
    fn chains(&self) -> Vec<&ChainRecord>;
}

/// [`ObjectSource`] backed by vectors.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    atoms: Vec<AtomRecord>,
    chains: Vec<ChainRecord>,
    atom_index: FxHashMap<ObjectId, usize>,
    chain_index: FxHashMap<ObjectId, usize>,
}

impl MemorySource {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom. A later record with the same id replaces the lookup.
    pub fn push_atom(&mut self, atom: AtomRecord) {
        let _ = self.atom_index.insert(atom.id, self.atoms.len());
        self.atoms.push(atom);
    }

    /// Add a chain. A later record with the same id replaces the lookup.
    pub fn push_chain(&mut self, chain: ChainRecord) {
        let _ = self.chain_index.insert(chain.id, self.chains.len());
        self.chains.push(chain);
    }
}

impl ObjectSource for MemorySource {
    fn atom(&self, id: ObjectId) -> Option<&AtomRecord> {
        self.atom_index.get(&id).and_then(|&i| self.atoms.get(i))
    }

    fn chain(&self, id: ObjectId) -> Option<&ChainRecord> {
        self.chain_index.get(&id).and_then(|&i| self.chains.get(i))
    }

    fn atoms(&self) -> Vec<&AtomRecord> {
        self.atoms.iter().collect()
    }

    fn chains(&self) -> Vec<&ChainRecord> {
        self.chains.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_resolves_by_id() {
        let mut source = MemorySource::new();
        source.push_atom(AtomRecord::new(ObjectId(7), "O", Vec3::X, 1.5));
        source.push_chain(ChainRecord {
            id: ObjectId(100),
            residues: vec![ResidueRecord::trace(
                ObjectId(101),
                "GLY",
                Vec3::ZERO,
                SSType::Coil,
            )],
        });
        assert_eq!(source.atom(ObjectId(7)).unwrap().element, "O");
        assert!(source.atom(ObjectId(100)).is_none());
        assert_eq!(source.chain(ObjectId(100)).unwrap().residues.len(), 1);
        assert_eq!(source.atoms().len(), 1);
        assert_eq!(source.chains().len(), 1);
    }
}
