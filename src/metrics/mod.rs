//! Cache Metrics System
//!
//! Hit, miss and eviction accounting for the SIEVE cache.
//!
//! Counting happens through a [`StatsRecorder`], which the cache receives at
//! construction and calls from every thread without holding any lock. The
//! default recorder, [`AtomicStats`], keeps three relaxed `AtomicU64`
//! counters. Reading them yields a [`CacheStats`] snapshot from which the
//! rates are derived.
//!
//! For reporting tools the cache also implements [`CacheMetrics`], which
//! flattens the snapshot into a `BTreeMap` so that the simulator can print and
//! export results for different algorithms side by side in a stable order.
//!
//! # Example
//!
//! ```
//! use sieve_rs::SieveCache;
//! use sieve_rs::metrics::CacheMetrics;
//!
//! let cache = SieveCache::new(2).unwrap();
//! cache.put("a", 1);
//! cache.get(&"a");
//! cache.get(&"b");
//!
//! let metrics = cache.metrics();
//! assert_eq!(metrics["cache_hits"], 1.0);
//! assert_eq!(metrics["cache_misses"], 1.0);
//! assert_eq!(cache.algorithm_name(), "SIEVE");
//! ```

use std::collections::BTreeMap;

mod stats;

pub use stats::{AtomicStats, CacheStats, StatsRecorder};

/// Trait that all cache algorithms implement for metrics reporting.
///
/// The returned map uses `BTreeMap` so that keys always come out in the same
/// order, which keeps printed reports and CSV exports comparable between
/// runs.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification, e.g. `"SIEVE"`.
    fn algorithm_name(&self) -> &'static str;
}

impl CacheStats {
    /// Flattens the snapshot into metric name and value pairs.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.hits() as f64);
        metrics.insert("cache_misses".to_string(), self.misses() as f64);
        metrics.insert("evictions".to_string(), self.evictions() as f64);
        metrics.insert("requests".to_string(), self.total_requests() as f64);

        // Rates (0.0 to 1.0)
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.total_requests() > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions() as f64 / self.total_requests() as f64,
            );
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_btreemap_has_stable_keys() {
        let stats = CacheStats::new(3, 1, 2);
        let metrics = stats.to_btreemap();
        let keys: Vec<&str> = metrics.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "cache_hits",
                "cache_misses",
                "eviction_rate",
                "evictions",
                "hit_rate",
                "miss_rate",
                "requests",
            ]
        );
        assert_eq!(metrics["hit_rate"], 0.75);
        assert_eq!(metrics["eviction_rate"], 0.5);
    }

    #[test]
    fn test_btreemap_without_requests() {
        let metrics = CacheStats::default().to_btreemap();
        assert_eq!(metrics["hit_rate"], 0.0);
        assert!(!metrics.contains_key("eviction_rate"));
    }
}
