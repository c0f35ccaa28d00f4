//! Implements the LRU eviction policy.

use std::{hash::Hash, num::NonZeroUsize};

use hashlink::LinkedHashMap;

/// A bounded map that evicts its least recently used key on overflow.
///
/// Keys are kept in a [`LinkedHashMap`] ordered according to the last-used policy: the front is
/// the least recently used key, the back the most recently used one. The map is not
/// synchronized; owners are expected to guard it with a lock.
#[derive(Debug)]
pub struct LruMap<K, V> {
    /// The ordered set of keys, ordered according to the last-used policy.
    ordered_key_map: LinkedHashMap<K, V>,
    capacity: NonZeroUsize,
}

impl<K: Eq + Hash, V> LruMap<K, V> {
    /// Creates an empty map holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            ordered_key_map: LinkedHashMap::new(),
            capacity,
        }
    }

    /// The maximum number of entries this map holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// The number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered_key_map.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered_key_map.is_empty()
    }

    /// Returns `true` if `key` is present. Does not count as a use.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.ordered_key_map.contains_key(key)
    }

    /// Inserts or overwrites `key` and marks it most recently used.
    ///
    /// Returns the evicted entry if the insertion pushed the map over capacity. Overwriting an
    /// existing key never evicts.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.ordered_key_map.remove(&key);
        self.ordered_key_map.insert(key, value);
        if self.ordered_key_map.len() > self.capacity.get() {
            return self.ordered_key_map.pop_front();
        }
        None
    }

    /// Marks `key` most recently used. Returns `false` if the key is absent.
    pub fn touch(&mut self, key: &K) -> bool {
        self.ordered_key_map.to_back(key).is_some()
    }

    /// Returns the value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.touch(key) {
            self.ordered_key_map.get(key)
        } else {
            None
        }
    }

    /// Returns the value for `key` without affecting its recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.ordered_key_map.get(key)
    }

    /// Mutable access to the value for `key` without affecting its recency.
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        self.ordered_key_map.get_mut(key)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.ordered_key_map.remove(key)
    }

    /// Iterates entries from least to most recently used. Does not count as a use.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.ordered_key_map.iter()
    }
}
