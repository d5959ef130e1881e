//! Pick names for renderables.

use rustc_hash::FxHashMap;

use crate::scene::ObjectId;

/// Maps 1-based pick names to object identities.
///
/// Name `0` is the pick target's clear value and never resolves.
#[derive(Debug, Clone, Default)]
pub struct PickMap {
    objects: Vec<ObjectId>,
    names: FxHashMap<ObjectId, u32>,
}

impl PickMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for `id`, assigning the next free one on first use.
    pub fn assign(&mut self, id: ObjectId) -> u32 {
        if let Some(&name) = self.names.get(&id) {
            return name;
        }
        self.objects.push(id);
        let name = self.objects.len() as u32;
        let _ = self.names.insert(id, name);
        name
    }

    /// Name previously assigned to `id`.
    #[must_use]
    pub fn name_of(&self, id: ObjectId) -> Option<u32> {
        self.names.get(&id).copied()
    }

    /// Resolve a raw value read back from the pick target.
    #[must_use]
    pub fn resolve(&self, raw: u32) -> Option<ObjectId> {
        let index = raw.checked_sub(1)?;
        self.objects.get(index as usize).copied()
    }

    /// Number of names handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no names were handed out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Forget every name.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_one_based_and_stable() {
        let mut map = PickMap::new();
        assert_eq!(map.assign(ObjectId(40)), 1);
        assert_eq!(map.assign(ObjectId(7)), 2);
        assert_eq!(map.assign(ObjectId(40)), 1);
        assert_eq!(map.len(), 2);
        assert_eq!(map.name_of(ObjectId(7)), Some(2));
    }

    #[test]
    fn zero_and_unknown_names_miss() {
        let mut map = PickMap::new();
        let name = map.assign(ObjectId(3));
        assert_eq!(map.resolve(name), Some(ObjectId(3)));
        assert_eq!(map.resolve(0), None);
        assert_eq!(map.resolve(99), None);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.resolve(name), None);
    }
}
