use std::hash::Hash;

use crate::prelude::*;

/// Bijection between opaque identifiers and dense zero-based indices.
///
/// Indices are assigned in first-seen order and never change afterwards.
#[derive(Debug, Clone)]
pub struct IdMap<K> {
    indices: AHashMap<K, usize>,
    ids: Vec<K>,
}

impl<K> Default for IdMap<K> {
    fn default() -> Self {
        Self {
            indices: AHashMap::default(),
            ids: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> IdMap<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the identifier, assigning the next free one if it is new.
    pub fn add(&mut self, id: K) -> usize {
        let next_index = self.ids.len();
        *self.indices.entry(id).or_insert_with_key(|id| {
            self.ids.push(id.clone());
            next_index
        })
    }

    #[must_use]
    pub fn get(&self, id: &K) -> Option<usize> {
        self.indices.get(id).copied()
    }

    /// Inverse lookup.
    ///
    /// # Panics
    ///
    /// Panics when the index was not produced by this map.
    #[must_use]
    pub fn lookup(&self, index: usize) -> &K {
        &self.ids[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[K] {
        &self.ids
    }
}
