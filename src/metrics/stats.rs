//! Hit, miss and eviction counters.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Sink for cache events.
///
/// The cache calls the `record_*` methods concurrently from many threads and
/// never while holding its structural lock for a `get`. Implementations must
/// therefore be cheap and internally synchronized.
///
/// Implement this to forward cache events into an application's own metrics
/// pipeline:
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use sieve_rs::config::SieveCacheConfig;
/// use sieve_rs::metrics::{CacheStats, StatsRecorder};
/// use sieve_rs::SieveCache;
///
/// #[derive(Default)]
/// struct HitsOnly(AtomicU64);
///
/// impl StatsRecorder for HitsOnly {
///     fn record_hit(&self) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
///     fn record_miss(&self) {}
///     fn record_eviction(&self) {}
///     fn snapshot(&self) -> CacheStats {
///         CacheStats::new(self.0.load(Ordering::Relaxed), 0, 0)
///     }
///     fn reset(&self) {
///         self.0.store(0, Ordering::Relaxed);
///     }
/// }
///
/// let recorder = Arc::new(HitsOnly::default());
/// let config = SieveCacheConfig::new(4).unwrap();
/// let cache = SieveCache::with_stats(config, Arc::clone(&recorder));
/// cache.put(1, "one");
/// cache.get(&1);
/// assert_eq!(recorder.snapshot().hits(), 1);
/// ```
pub trait StatsRecorder: Send + Sync {
    /// A `get` found its key.
    fn record_hit(&self);

    /// A `get` did not find its key.
    fn record_miss(&self);

    /// An entry was removed to make room for an insertion.
    fn record_eviction(&self);

    /// Returns the current counter values.
    fn snapshot(&self) -> CacheStats;

    /// Sets every counter back to zero.
    fn reset(&self);
}

/// Default [`StatsRecorder`] backed by three atomic counters.
///
/// Counters are updated with relaxed ordering; they are statistics and carry
/// no synchronization duty.
#[derive(Debug, Default)]
pub struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl AtomicStats {
    /// Creates a recorder with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsRecorder for AtomicStats {
    #[inline]
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.evictions.load(Ordering::Relaxed),
        )
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of the cache counters.
///
/// All rates are computed from the three counters held here, so a snapshot
/// always agrees with itself (`hits + misses == total_requests`) even when it
/// was taken while other threads were still counting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheStats {
    /// Builds a snapshot from raw counter values.
    pub const fn new(hits: u64, misses: u64, evictions: u64) -> Self {
        Self {
            hits,
            misses,
            evictions,
        }
    }

    /// Number of `get` calls that found their key.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of `get` calls that did not.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of entries removed by the eviction sweep.
    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Hits plus misses.
    #[inline]
    pub fn total_requests(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }

    /// Fraction of requests that hit, in `0.0..=1.0`. Zero when there were no
    /// requests.
    pub fn hit_rate(&self) -> f64 {
        match self.total_requests() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// Fraction of requests that missed, in `0.0..=1.0`. Zero when there were
    /// no requests.
    pub fn miss_rate(&self) -> f64 {
        match self.total_requests() {
            0 => 0.0,
            total => self.misses as f64 / total as f64,
        }
    }

    /// [`hit_rate`](Self::hit_rate) scaled to `0.0..=100.0`.
    #[inline]
    pub fn hit_rate_percent(&self) -> f64 {
        self.hit_rate() * 100.0
    }

    /// [`miss_rate`](Self::miss_rate) scaled to `0.0..=100.0`.
    #[inline]
    pub fn miss_rate_percent(&self) -> f64 {
        self.miss_rate() * 100.0
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats{{hits={}, misses={}, evictions={}, hitRate={:.2}%, requests={}}}",
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate_percent(),
            self.total_requests()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_stats() {
        let stats = CacheStats::default();
        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);
    }

    #[test]
    fn test_rates() {
        let stats = CacheStats::new(3, 1, 0);
        assert_eq!(stats.total_requests(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.miss_rate(), 0.25);
        assert_eq!(stats.hit_rate_percent(), 75.0);
        assert_eq!(stats.miss_rate_percent(), 25.0);
    }

    #[test]
    fn test_display() {
        let stats = CacheStats::new(2, 1, 5);
        assert_eq!(
            stats.to_string(),
            "CacheStats{hits=2, misses=1, evictions=5, hitRate=66.67%, requests=3}"
        );
    }

    #[test]
    fn test_atomic_stats_record_and_reset() {
        let stats = AtomicStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();
        assert_eq!(stats.snapshot(), CacheStats::new(2, 1, 1));

        stats.reset();
        assert_eq!(stats.snapshot(), CacheStats::default());
    }

    #[test]
    fn test_atomic_stats_concurrent_counts() {
        let stats = Arc::new(AtomicStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_hit();
                        stats.record_miss();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits(), 8000);
        assert_eq!(snapshot.misses(), 8000);
        assert_eq!(snapshot.hit_rate(), 0.5);
    }
}
