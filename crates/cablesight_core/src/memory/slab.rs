//! # Slot Arena
//!
//! Growable slot storage with a free list and generation counters.

/// Handle to a value stored in a [`SlotArena`].
///
/// A handle is only valid while the generation it captured matches the
/// slot's current generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle {
    /// Slot index.
    index: u32,
    /// Generation of the slot when the value was inserted.
    generation: u32,
}

impl SlotHandle {
    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation captured by this handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena.
///
/// Insert and remove are O(1). Removed slots are recycled through a free
/// list; recycling bumps the generation so old handles stop resolving.
///
/// # Thread Safety
///
/// Not synchronized. The arena is owned by a single engine instance and
/// mutated only from its tick.
#[derive(Debug)]
pub struct SlotArena<T> {
    /// Backing slots.
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots, most recently freed last.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    live: usize,
}

impl<T> SlotArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty arena with room for `capacity` values before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no values are stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Stores a value and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots are ever allocated.
    pub fn insert(&mut self, value: T) -> SlotHandle {
        self.live += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SlotHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).expect("slot arena exceeded u32 indices");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotHandle {
            index,
            generation: 0,
        }
    }

    /// Removes a value, returning it if the handle was still valid.
    pub fn remove(&mut self, handle: SlotHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.live -= 1;

        Some(value)
    }

    /// Returns true if the handle resolves to a live value.
    #[must_use]
    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a reference to a live value.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Gets a mutable reference to a live value.
    #[inline]
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Iterates over all live values.
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Iterates mutably over all live values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotHandle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|value| {
                (
                    SlotHandle {
                        index: index as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }

    /// Removes every value. Outstanding handles are invalidated.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index as u32);
        }
        self.free_list.reverse();
        self.live = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut arena = SlotArena::new();

        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&1));

        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena = SlotArena::new();

        let old = arena.insert("conductor");
        arena.remove(old);
        let new = arena.insert("jacket");

        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new), Some(&"jacket"));
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut arena = SlotArena::with_capacity(4);
        let handles: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();

        arena.clear();
        assert!(arena.is_empty());
        assert!(handles.iter().all(|h| !arena.contains(*h)));

        let reused = arena.insert(9);
        assert_eq!(reused.index(), 0);
        assert_eq!(arena.iter().count(), 1);
    }

    #[test]
    fn test_iter_mut() {
        let mut arena = SlotArena::new();
        arena.insert(1);
        let gone = arena.insert(2);
        arena.insert(3);
        arena.remove(gone);

        for (_, value) in arena.iter_mut() {
            *value *= 10;
        }

        let mut values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![10, 30]);
    }
}
