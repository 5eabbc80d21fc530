//! Guided walkthrough of the SIEVE cache
//!
//! Each step prints what it does and what the cache reports back, so the
//! output doubles as a tour of the public API.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sieve_rs::{ConfigError, SieveCache};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::generator::ZipfSampler;

/// Run every section of the walkthrough
pub fn run() -> Result<(), ConfigError> {
    println!("=== SIEVE Cache Demo ===\n");

    basic_usage()?;
    eviction_walkthrough()?;
    statistics()?;
    zipfian_performance()?;
    concurrent_access()?;
    Ok(())
}

fn basic_usage() -> Result<(), ConfigError> {
    println!("1. Basic Usage");
    println!("--------------");

    let cache = SieveCache::new(5)?;
    cache.put("user:1", "Alice");
    cache.put("user:2", "Bob");
    cache.put("user:3", "Charlie");

    println!("Retrieved user:1 = {:?}", cache.get(&"user:1"));
    println!("Retrieved user:4 = {:?}", cache.get(&"user:4"));
    println!("Cache size: {}", cache.len());

    println!("Removed: {:?}", cache.remove(&"user:2"));
    println!("Cache size after removal: {}", cache.len());
    println!();
    Ok(())
}

fn eviction_walkthrough() -> Result<(), ConfigError> {
    println!("2. Eviction Walkthrough");
    println!("-----------------------");

    let cache = SieveCache::new(3)?;
    cache.put(1, "one");
    cache.put(2, "two");
    cache.put(3, "three");
    cache.get(&1);
    cache.get(&2);
    println!("Filled with 1, 2, 3 and read 1 and 2:");
    println!("{cache}");

    cache.put(4, "four");
    println!("\nInserted 4; the hand cleared 1 and 2 and evicted 3:");
    println!("{cache}");
    println!();
    Ok(())
}

fn statistics() -> Result<(), ConfigError> {
    println!("3. Statistics");
    println!("-------------");

    let cache = SieveCache::new(10)?;
    for i in 0..10 {
        cache.put(format!("key{i}"), i * 10);
    }

    cache.get("key1");
    cache.get("key2");
    cache.get("key3");
    cache.get("missing1");
    cache.get("missing2");

    // Two more insertions force two evictions.
    cache.put("key10".to_string(), 100);
    cache.put("key11".to_string(), 110);

    let stats = cache.stats();
    println!("Cache Statistics:");
    println!("  Hits: {}", stats.hits());
    println!("  Misses: {}", stats.misses());
    println!("  Total Requests: {}", stats.total_requests());
    println!("  Hit Rate: {:.2}%", stats.hit_rate_percent());
    println!("  Evictions: {}", stats.evictions());
    println!("  Summary: {stats}");
    println!();
    Ok(())
}

fn zipfian_performance() -> Result<(), ConfigError> {
    println!("4. Performance (Zipfian Distribution)");
    println!("-------------------------------------");

    const CAPACITY: u32 = 1_000;
    const TOTAL_REQUESTS: usize = 50_000;

    let cache = SieveCache::new(CAPACITY as usize)?;
    for i in 0..CAPACITY {
        cache.put(format!("key{i}"), format!("value{i}"));
    }
    cache.clear_stats();

    let sampler = ZipfSampler::new(CAPACITY * 2, 0.8);
    let mut rng = StdRng::seed_from_u64(42);

    let start = Instant::now();
    for _ in 0..TOTAL_REQUESTS {
        let id = sampler.sample(&mut rng);
        let key = format!("key{id}");
        if cache.get(&key).is_none() {
            cache.put(key, format!("value{id}"));
        }
    }
    let elapsed = start.elapsed();

    let stats = cache.stats();
    println!("Performance Results:");
    println!("  Total requests: {TOTAL_REQUESTS}");
    println!("  Duration: {:.2} ms", elapsed.as_secs_f64() * 1_000.0);
    println!(
        "  Throughput: {:.0} ops/sec",
        TOTAL_REQUESTS as f64 / elapsed.as_secs_f64()
    );
    println!("  Hit rate: {:.2}%", stats.hit_rate_percent());
    println!("  Evictions: {}", stats.evictions());
    println!();
    Ok(())
}

fn concurrent_access() -> Result<(), ConfigError> {
    println!("5. Concurrent Access");
    println!("--------------------");

    const THREADS: usize = 8;
    const OPS_PER_THREAD: usize = 10_000;

    let cache = Arc::new(SieveCache::new(512)?);
    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = (t * 131 + i * 7) % 1_024;
                    if cache.get(&key).is_none() {
                        cache.put(key, t);
                    }
                }
            })
        })
        .collect();

    let mut panicked = 0;
    for handle in handles {
        if handle.join().is_err() {
            panicked += 1;
        }
    }
    let elapsed = start.elapsed();

    println!("  Threads: {THREADS}, ops per thread: {OPS_PER_THREAD}");
    println!("  Duration: {:.2?}", elapsed);
    println!("  Size: {}/{}", cache.len(), cache.capacity());
    println!("  {}", cache.stats());
    match cache.check_invariants() {
        Ok(()) if panicked == 0 => println!("  Structure consistent after concurrent access"),
        Ok(()) => println!("  {panicked} worker(s) panicked"),
        Err(err) => println!("  Inconsistent structure: {err}"),
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_demo_runs() {
        super::run().unwrap();
    }
}
