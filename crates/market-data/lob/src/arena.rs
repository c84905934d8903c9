//! Generation-checked slot map holding resting orders
//!
//! Keys stay valid for as long as the value they point at is alive. Once a
//! slot is freed its generation is bumped, so a stale key from before the
//! reuse resolves to nothing instead of to the new occupant.

/// Stable handle into an [`OrderArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderKey {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot map with free-list reuse
#[derive(Debug, Clone)]
pub struct OrderArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> OrderArena<T> {
    /// Create an empty arena
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Create an arena with room for `capacity` values before reallocating
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live values
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if no value is live
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a value and return its key
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, value: T) -> OrderKey {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return OrderKey {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        OrderKey {
            index,
            generation: 0,
        }
    }

    /// Borrow the value behind `key`, if it is still live
    #[inline]
    #[must_use]
    pub fn get(&self, key: OrderKey) -> Option<&T> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutably borrow the value behind `key`, if it is still live
    #[inline]
    pub fn get_mut(&mut self, key: OrderKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// True if `key` still refers to a live value
    #[must_use]
    pub fn contains(&self, key: OrderKey) -> bool {
        self.get(key).is_some()
    }

    /// Take the value out and free its slot
    pub fn remove(&mut self, key: OrderKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }
}

impl<T> Default for OrderArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = OrderArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_key_after_reuse() {
        let mut arena = OrderArena::new();
        let old = arena.insert(1);
        arena.remove(old);
        let new = arena.insert(2);

        // Same slot, different generation
        assert_ne!(old, new);
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.remove(old), None);
        assert_eq!(arena.get(new), Some(&2));
    }

    #[test]
    fn test_get_mut() {
        let mut arena = OrderArena::with_capacity(4);
        let key = arena.insert(10);
        if let Some(value) = arena.get_mut(key) {
            *value += 5;
        }
        assert_eq!(arena.get(key), Some(&15));
        assert!(arena.contains(key));
        assert!(!arena.is_empty());
    }
}
