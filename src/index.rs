//! Lookup index: key to live entry.
//!
//! The index is the authority on liveness. An entry is cached iff the index
//! maps its key to it. Point lookups are safe from any thread at any time;
//! `insert`, `remove_entry` and `clear` are called only with the cache's
//! structural lock held, which is what keeps the index and the recency queue
//! in agreement.
//!
//! Lookups clone the entry's `Arc` and release the shard guard before
//! returning, so a caller never holds a `DashMap` guard while it goes on to
//! mutate the map.

use crate::entry::Entry;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use dashmap::DashMap;
use std::sync::Arc;

pub(crate) struct Index<K, V, S> {
    map: DashMap<K, Arc<Entry<K, V>>, S>,
}

impl<K, V, S> Index<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Index {
            map: DashMap::with_capacity_and_hasher(capacity, hash_builder),
        }
    }

    /// Returns the live entry for `key`, if any.
    #[inline]
    pub(crate) fn lookup<Q>(&self, key: &Q) -> Option<Arc<Entry<K, V>>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).map(|guard| Arc::clone(guard.value()))
    }

    #[inline]
    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Returns `true` if `entry` is the entry currently indexed under its key.
    pub(crate) fn holds(&self, entry: &Arc<Entry<K, V>>) -> bool {
        self.map
            .get(entry.key())
            .is_some_and(|guard| Arc::ptr_eq(guard.value(), entry))
    }

    /// Structural lock must be held.
    #[inline]
    pub(crate) fn insert(&self, key: K, entry: Arc<Entry<K, V>>) -> Option<Arc<Entry<K, V>>> {
        self.map.insert(key, entry)
    }

    /// Removes whatever entry is indexed under `key`.
    ///
    /// Structural lock must be held.
    #[inline]
    pub(crate) fn remove<Q>(&self, key: &Q) -> Option<Arc<Entry<K, V>>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(key).map(|(_, entry)| entry)
    }

    /// Removes `entry` only if it is still the one indexed under its key.
    ///
    /// Structural lock must be held.
    pub(crate) fn remove_entry(&self, entry: &Arc<Entry<K, V>>) -> bool {
        self.map
            .remove_if(entry.key(), |_, indexed| Arc::ptr_eq(indexed, entry))
            .is_some()
    }

    /// Structural lock must be held.
    #[inline]
    pub(crate) fn clear(&self) {
        self.map.clear();
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
