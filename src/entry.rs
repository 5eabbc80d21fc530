//! Cache Entry Type
//!
//! An [`Entry`] is one cached key-value pair plus the SIEVE visited bit. It is
//! shared between the lookup index and the recency queue through an `Arc`,
//! and it is the only place where state is touched without the structural
//! lock.
//!
//! # Lock-free fields
//!
//! | Field     | Type           | Mutated by                         |
//! |-----------|----------------|------------------------------------|
//! | `value`   | `ArcSwap<V>`   | `put` on an existing key           |
//! | `visited` | `AtomicBool`   | `get`, `put`, and the eviction sweep |
//!
//! `key` and `slot` are fixed when the entry is created. Queue links are not
//! stored here at all; they belong to the lock-protected list.
//!
//! A value replacement publishes a whole new `Arc<V>`, so a concurrent reader
//! sees either the old value or the new one, never a mix of both.

use crate::list::Slot;
use arc_swap::ArcSwap;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One cached key-value pair with its SIEVE metadata.
pub(crate) struct Entry<K, V> {
    key: K,
    value: ArcSwap<V>,
    visited: AtomicBool,
    slot: Slot,
}

impl<K, V> Entry<K, V> {
    /// Creates an unvisited entry that will live at `slot` in the queue.
    pub(crate) fn new(key: K, value: V, slot: Slot) -> Self {
        Entry {
            key,
            value: ArcSwap::from_pointee(value),
            visited: AtomicBool::new(false),
            slot,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    /// Position of this entry in the recency queue.
    #[inline]
    pub(crate) fn slot(&self) -> Slot {
        self.slot
    }

    /// Returns the current value.
    #[inline]
    pub(crate) fn load(&self) -> Arc<V> {
        self.value.load_full()
    }

    /// Replaces the value and marks the entry visited.
    #[inline]
    pub(crate) fn update(&self, value: V) {
        self.value.store(Arc::new(value));
        self.mark_visited();
    }

    #[inline]
    pub(crate) fn mark_visited(&self) {
        self.visited.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_visited(&self) -> bool {
        self.visited.load(Ordering::Acquire)
    }

    /// Clears the visited bit if it is set.
    ///
    /// Returns `true` if the bit was set. The test and the clear are a single
    /// atomic step, so a concurrent `mark_visited` either lands before it (and
    /// is consumed) or after it (and survives).
    #[inline]
    pub(crate) fn clear_visited(&self) -> bool {
        self.visited
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl<K: Clone, V: Clone> Entry<K, V> {
    /// Consumes a shared entry and returns its value, cloning only if
    /// another reader still holds it.
    pub(crate) fn into_value(self: Arc<Self>) -> V {
        let value = self.load();
        drop(self);
        Arc::try_unwrap(value).unwrap_or_else(|shared| V::clone(&shared))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.load())
            .field("visited", &self.is_visited())
            .field("slot", &self.slot)
            .finish()
    }
}
