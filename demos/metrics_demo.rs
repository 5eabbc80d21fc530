//! Cache Metrics Demonstration
//!
//! Runs a small workload through two caches, one with the default counters and
//! one with a custom recorder, then prints their metrics in the deterministic
//! `BTreeMap` order used by reporting tools.
//!
//! Run with: cargo run --example metrics_demo

use sieve_rs::config::SieveCacheConfig;
use sieve_rs::metrics::{CacheMetrics, CacheStats, StatsRecorder};
use sieve_rs::{SieveCache, StatisticalCache};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Recorder that keeps the usual counters plus a 1-in-2 sample of hits.
#[derive(Default)]
struct SampledStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    sampled_hits: AtomicU64,
}

impl StatsRecorder for SampledStats {
    fn record_hit(&self) {
        let previous = self.hits.fetch_add(1, Ordering::Relaxed);
        if previous % 2 == 0 {
            self.sampled_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

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
        self.sampled_hits.store(0, Ordering::Relaxed);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Cache Metrics Demonstration");
    println!("===========================\n");

    let capacity = 3;
    println!("Workload: capacity {capacity}, insert 3 fruits, read some, insert 2 more\n");

    let default_cache: SieveCache<&'static str, i32> = SieveCache::new(capacity).unwrap();
    run_workload(&default_cache);

    let recorder = Arc::new(SampledStats::default());
    let config = SieveCacheConfig::new(capacity).unwrap();
    let custom_cache: SieveCache<&'static str, i32, SampledStats> =
        SieveCache::with_stats(config, Arc::clone(&recorder));
    run_workload(&custom_cache);

    print_metrics(&default_cache);
    print_metrics(&custom_cache);
    println!(
        "Sampled hits from the custom recorder: {}\n",
        recorder.sampled_hits.load(Ordering::Relaxed)
    );

    println!("Summary line:  {}", default_cache.stats());
    println!(
        "Hit rate via StatisticalCache: {:.2}%",
        default_cache.hit_rate_percent()
    );

    default_cache.clear_stats();
    println!("After clear_stats: {}", default_cache.stats());
}

fn run_workload<R: StatsRecorder>(cache: &SieveCache<&'static str, i32, R>) {
    cache.put("apple", 1);
    cache.put("banana", 2);
    cache.put("cherry", 3);

    cache.get(&"apple");
    cache.get(&"apple");
    cache.get(&"banana");
    cache.get(&"kiwi");
    cache.get(&"mango");

    // cherry was never read, so it goes first.
    cache.put("date", 4);
    cache.put("elderberry", 5);
}

fn print_metrics(cache: &dyn CacheMetrics) {
    let metrics: BTreeMap<String, f64> = cache.metrics();
    println!("{} metrics:", cache.algorithm_name());
    for (name, value) in &metrics {
        if name.ends_with("_rate") {
            println!("  {:<16} {:>8.2}%", name, value * 100.0);
        } else {
            println!("  {:<16} {:>8}", name, value);
        }
    }
    println!();
}
