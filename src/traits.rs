//! Common cache interface.
//!
//! [`Cache`] is the contract shared by every cache that can be driven through
//! a `&self` reference from many threads at once. [`SieveCache`](crate::SieveCache)
//! implements it, and so do the baseline caches in the workload simulator,
//! which is what lets one benchmark loop compare them.
//!
//! [`StatisticalCache`] adds hit and miss accounting on top.

use crate::metrics::CacheStats;

/// A bounded, thread-safe key-value cache.
///
/// # Example
///
/// ```
/// use sieve_rs::{Cache, SieveCache};
///
/// fn warm<C: Cache<u32, String>>(cache: &C) {
///     for i in 0..cache.capacity() as u32 {
///         cache.put(i, i.to_string());
///     }
/// }
///
/// let cache: SieveCache<u32, String> = SieveCache::new(8).unwrap();
/// warm(&cache);
/// assert!(cache.is_full());
/// ```
pub trait Cache<K, V> {
    /// Returns a copy of the value cached under `key`, if any.
    fn get(&self, key: &K) -> Option<V>;

    /// Caches `value` under `key`, replacing any previous value.
    fn put(&self, key: K, value: V);

    /// Removes `key` and returns its value, if it was cached.
    fn remove(&self, key: &K) -> Option<V>;

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// Maximum number of cached entries.
    fn capacity(&self) -> usize;

    /// Removes every entry.
    fn clear(&self);

    /// Returns `true` if `key` is cached.
    fn contains_key(&self, key: &K) -> bool;

    /// Returns `true` if nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the cache holds `capacity()` entries.
    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

/// A [`Cache`] that counts hits, misses and evictions.
pub trait StatisticalCache<K, V>: Cache<K, V> {
    /// Returns a snapshot of the counters.
    fn stats(&self) -> CacheStats;

    /// Resets every counter to zero without touching cached entries.
    fn clear_stats(&self);

    /// Share of `get` calls that hit, as a percentage.
    fn hit_rate_percent(&self) -> f64 {
        self.stats().hit_rate_percent()
    }

    /// Share of `get` calls that missed, as a percentage.
    fn miss_rate_percent(&self) -> f64 {
        self.stats().miss_rate_percent()
    }
}
