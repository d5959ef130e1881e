//! Named and ad-hoc selections of object identities.

use std::collections::{BTreeMap, BTreeSet};

use crate::scene::{ObjectId, ObjectSource};

/// Element symbols counted as metals.
const METALS: &[&str] = &[
    "Li", "Be", "Na", "Mg", "Al", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu",
    "Zn", "Ga", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "U",
];

/// Residue names of water molecules.
const WATER: &[&str] = &["HOH", "WAT", "H2O", "DOD"];

/// Returns `true` if `symbol` names a metal.
#[must_use]
pub fn is_metal(symbol: &str) -> bool {
    METALS.iter().any(|metal| metal.eq_ignore_ascii_case(symbol))
}

/// Returns `true` if `residue` names a water molecule.
#[must_use]
pub fn is_water(residue: &str) -> bool {
    WATER.iter().any(|water| water.eq_ignore_ascii_case(residue))
}

/// Selections the scene maintains for every load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedSelection {
    /// Every atom and chain.
    All,
    /// Every atom.
    Atoms,
    /// Every chain.
    Chains,
    /// Every residue of every chain.
    Residues,
    /// Hydrogen atoms.
    Hydrogens,
    /// Sulphur atoms.
    Sulphur,
    /// Atoms of water molecules.
    Water,
    /// Heterogen atoms, water included.
    Heterogens,
    /// Metal atoms.
    Metals,
}

impl NamedSelection {
    /// Every named selection.
    pub const ALL: [Self; 9] = [
        Self::All,
        Self::Atoms,
        Self::Chains,
        Self::Residues,
        Self::Hydrogens,
        Self::Sulphur,
        Self::Water,
        Self::Heterogens,
        Self::Metals,
    ];
}

/// Identities a command is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A selection maintained by the scene.
    Named(NamedSelection),
    /// An ad-hoc identity set.
    Custom(BTreeSet<ObjectId>),
}

impl From<NamedSelection> for Selection {
    fn from(name: NamedSelection) -> Self {
        Self::Named(name)
    }
}

impl FromIterator<ObjectId> for Selection {
    fn from_iter<I: IntoIterator<Item = ObjectId>>(iter: I) -> Self {
        Self::Custom(iter.into_iter().collect())
    }
}

/// The named selections of one load.
#[derive(Debug, Clone, Default)]
pub struct SelectionSets {
    sets: BTreeMap<NamedSelection, BTreeSet<ObjectId>>,
}

impl SelectionSets {
    /// Classify every record in `source`.
    #[must_use]
    pub fn from_source(source: &dyn ObjectSource) -> Self {
        let mut sets = Self::default();
        for chain in source.chains() {
            sets.add(NamedSelection::All, chain.id);
            sets.add(NamedSelection::Chains, chain.id);
            for residue in &chain.residues {
                sets.add(NamedSelection::Residues, residue.id);
            }
        }
        for atom in source.atoms() {
            sets.add(NamedSelection::All, atom.id);
            sets.add(NamedSelection::Atoms, atom.id);
            if atom.element.eq_ignore_ascii_case("H") {
                sets.add(NamedSelection::Hydrogens, atom.id);
            }
            if atom.element.eq_ignore_ascii_case("S") {
                sets.add(NamedSelection::Sulphur, atom.id);
            }
            if is_metal(&atom.element) {
                sets.add(NamedSelection::Metals, atom.id);
            }
            let water = atom.residue_name.as_deref().is_some_and(is_water);
            if water {
                sets.add(NamedSelection::Water, atom.id);
            }
            if atom.hetero || water {
                sets.add(NamedSelection::Heterogens, atom.id);
            }
        }
        sets
    }

    fn add(&mut self, name: NamedSelection, id: ObjectId) {
        let _ = self.sets.entry(name).or_default().insert(id);
    }

    /// Members of `name`, in identity order.
    pub fn members(&self, name: NamedSelection) -> impl Iterator<Item = ObjectId> + '_ {
        self.sets.get(&name).into_iter().flatten().copied()
    }

    /// Number of members of `name`.
    #[must_use]
    pub fn count(&self, name: NamedSelection) -> usize {
        self.sets.get(&name).map_or(0, BTreeSet::len)
    }

    /// Forget every selection.
    pub fn clear(&mut self) {
        self.sets.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene::{AtomRecord, ChainRecord, MemorySource, ResidueRecord, SSType};

    fn atom(id: u64, element: &str, residue: Option<&str>, hetero: bool) -> AtomRecord {
        let mut record = AtomRecord::new(ObjectId(id), element, Vec3::ZERO, 1.0);
        record.residue_name = residue.map(str::to_owned);
        record.hetero = hetero;
        record
    }

    #[test]
    fn atoms_are_classified_by_element_and_residue() {
        let mut source = MemorySource::new();
        source.push_atom(atom(1, "H", None, false));
        source.push_atom(atom(2, "S", Some("CYS"), false));
        source.push_atom(atom(3, "Zn", None, true));
        source.push_atom(atom(4, "O", Some("HOH"), false));
        source.push_atom(atom(5, "C", Some("HEM"), true));
        let sets = SelectionSets::from_source(&source);

        assert_eq!(sets.count(NamedSelection::Atoms), 5);
        assert_eq!(sets.members(NamedSelection::Hydrogens).collect::<Vec<_>>(), vec![ObjectId(1)]);
        assert_eq!(sets.members(NamedSelection::Sulphur).collect::<Vec<_>>(), vec![ObjectId(2)]);
        assert_eq!(sets.members(NamedSelection::Metals).collect::<Vec<_>>(), vec![ObjectId(3)]);
        assert_eq!(sets.members(NamedSelection::Water).collect::<Vec<_>>(), vec![ObjectId(4)]);
        assert_eq!(
            sets.members(NamedSelection::Heterogens).collect::<Vec<_>>(),
            vec![ObjectId(3), ObjectId(4), ObjectId(5)]
        );
    }

    #[test]
    fn chains_and_residues_join_all() {
        let mut source = MemorySource::new();
        source.push_chain(ChainRecord {
            id: ObjectId(10),
            residues: vec![
                ResidueRecord::trace(ObjectId(11), "ALA", Vec3::ZERO, SSType::Coil),
                ResidueRecord::trace(ObjectId(12), "GLY", Vec3::X, SSType::Coil),
            ],
        });
        source.push_atom(atom(1, "C", None, false));
        let sets = SelectionSets::from_source(&source);
        assert_eq!(sets.count(NamedSelection::Chains), 1);
        assert_eq!(sets.count(NamedSelection::Residues), 2);
        assert_eq!(
            sets.members(NamedSelection::All).collect::<Vec<_>>(),
            vec![ObjectId(1), ObjectId(10)]
        );
        assert_eq!(sets.count(NamedSelection::Metals), 0);
    }

    #[test]
    fn metal_check_ignores_case() {
        assert!(is_metal("FE"));
        assert!(is_metal("fe"));
        assert!(!is_metal("C"));
        assert!(is_water("hoh"));
    }
}
