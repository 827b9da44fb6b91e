//! Insertion-ordered storage with self-allocated ids.
//!
//! `IdStore` owns both the entries and the counter that names them, so an id
//! can only come from `insert_with` and is never handed out twice. Entries are
//! kept in an append-only sequence with a parallel id -> slot map; removal
//! leaves a hole that is squeezed out once holes outnumber live entries.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

const COMPACT_MIN_SLOTS: usize = 32;

#[derive(Debug, Clone)]
pub struct IdStore<T> {
    ids: Vec<u64>,
    slots: Vec<Option<T>>,
    index: HashMap<u64, usize>,
    next_id: u64,
}

impl<T> Default for IdStore<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            slots: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> IdStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id, builds the entry with it and appends it.
    pub fn insert_with(&mut self, build: impl FnOnce(u64) -> T) -> &mut T {
        let id = self.next_id;
        self.next_id += 1;

        let slot = self.slots.len();
        self.index.insert(id, slot);
        self.ids.push(id);
        self.slots.push(None);
        self.slots[slot].insert(build(id))
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_ref()
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_mut()
    }

    /// Removes the entry if present. Unknown ids are ignored.
    pub fn remove(&mut self, id: u64) -> Option<T> {
        let slot = self.index.remove(&id)?;
        let removed = self.slots[slot].take();
        if self.slots.len() >= COMPACT_MIN_SLOTS && self.slots.len() > 2 * self.index.len() {
            self.compact();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    fn compact(&mut self) {
        let ids = std::mem::take(&mut self.ids);
        let slots = std::mem::take(&mut self.slots);
        self.index.clear();

        for (id, slot) in ids.into_iter().zip(slots) {
            if let Some(value) = slot {
                self.index.insert(id, self.slots.len());
                self.ids.push(id);
                self.slots.push(Some(value));
            }
        }
    }
}

impl<T: Serialize> Serialize for IdStore<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_and_are_not_reused() {
        let mut store = IdStore::new();
        let a = *store.insert_with(|id| id);
        let b = *store.insert_with(|id| id);
        assert_eq!((a, b), (0, 1));

        store.remove(b);
        let c = *store.insert_with(|id| id);
        assert_eq!(c, 2);
        assert!(store.get(b).is_none());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut store = IdStore::new();
        for name in ["a", "b", "c", "d"] {
            store.insert_with(|_| name);
        }
        store.remove(1);
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), vec!["a", "c", "d"]);
        assert_eq!(store.get(2), Some(&"c"));
        assert_eq!(store.get(1), None);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut store: IdStore<&str> = IdStore::new();
        store.insert_with(|_| "a");
        assert_eq!(store.remove(7), None);
        assert_eq!(store.remove(0), Some("a"));
        assert_eq!(store.remove(0), None);
        assert!(store.is_empty());
        assert_eq!(store.get(0), None);
    }

    #[test]
    fn compaction_keeps_order_and_lookups() {
        let mut store = IdStore::new();
        for _ in 0..100 {
            store.insert_with(|id| id * 10);
        }
        for id in (0..100).filter(|id| id % 4 != 0) {
            store.remove(id);
        }

        assert_eq!(store.len(), 25);
        assert!(store.slots.len() < 100);
        let expected: Vec<u64> = (0..100).filter(|id| id % 4 == 0).map(|id| id * 10).collect();
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), expected);
        assert_eq!(store.get(96), Some(&960));
        assert_eq!(store.get(97), None);
        assert_eq!(*store.insert_with(|id| id), 100);
    }
}
