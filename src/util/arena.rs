//! Generational index arena.
//!
//! Dense slot storage where removed slots are recycled and each handle
//! carries the generation it was issued for, so a stale handle never
//! resolves to a newer occupant of the same slot.

/// Generation-checked index into an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    slot: u32,
    generation: u32,
}

impl Index {
    /// Slot position inside the arena.
    #[must_use]
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Generation the slot had when this index was issued.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with generational handles.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and return its handle.
    pub fn insert(&mut self, value: T) -> Index {
        self.len += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.value = Some(value);
            return Index {
                slot,
                generation: entry.generation,
            };
        }
        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Index {
            slot,
            generation: 0,
        }
    }

    /// Remove and return the value behind `index`, if it is still live.
    pub fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        let value = entry.value.take()?;
        self.free.push(index.slot);
        self.len -= 1;
        Some(value)
    }

    /// Shared access to a live value.
    #[must_use]
    pub fn get(&self, index: Index) -> Option<&T> {
        self.slots
            .get(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    /// Mutable access to a live value.
    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    /// Whether `index` still refers to a live value.
    #[must_use]
    pub fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    /// Number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no values are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.value.as_ref().map(|value| {
                (
                    Index {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Mutable live values in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, entry)| {
                let generation = entry.generation;
                entry.value.as_mut().map(|value| {
                    (
                        Index {
                            slot: slot as u32,
                            generation,
                        },
                        value,
                    )
                })
            })
    }

    /// Handles of all live values in slot order.
    #[must_use]
    pub fn indices(&self) -> Vec<Index> {
        self.iter().map(|(index, _)| index).collect()
    }

    /// Drop every value. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.value.take().is_some() {
                self.free.push(slot as u32);
            }
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a), Some("a"));
        let b = arena.insert("b");
        assert_eq!(a.slot(), b.slot());
        assert_ne!(a.generation(), b.generation());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn iteration_follows_slot_order() {
        let mut arena = Arena::new();
        let first = arena.insert(1);
        let _second = arena.insert(2);
        let _third = arena.insert(3);
        let _ = arena.remove(first);
        let values: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2, 3]);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.clear();
        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        let b = arena.insert(2);
        assert_ne!(a, b);
    }
}
