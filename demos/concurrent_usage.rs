//! Concurrent Cache Usage Examples
//!
//! This example demonstrates multi-threaded usage patterns for the SIEVE cache.
//!
//! Run with: cargo run --release --example concurrent_usage

use sieve_rs::SieveCache;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Concurrent Cache Usage Examples");
    println!("================================\n");

    basic_concurrent_usage();
    println!();

    zero_copy_get_with();
    println!();

    shared_values_survive_eviction();
    println!();

    throughput_by_thread_count();
}

/// Basic multi-threaded cache usage
fn basic_concurrent_usage() {
    println!("1. Basic Concurrent Usage");
    println!("   -----------------------");

    let cache = Arc::new(SieveCache::new(1000).unwrap());

    let num_threads = 4;
    let ops_per_thread = 1000;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = format!("thread{}-key{}", thread_id, i);
                    let value = thread_id * 10000 + i;

                    cache.put(key.clone(), value);

                    // Our own write is either still there or already evicted.
                    if let Some(v) = cache.get(&key) {
                        assert_eq!(v, value);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!("   Threads:    {}", num_threads);
    println!("   Cache size: {}/{}", cache.len(), cache.capacity());
    println!("   {}", cache.stats());
}

/// Reading through a closure without cloning the value
fn zero_copy_get_with() {
    println!("2. Zero-Copy Reads With get_with");
    println!("   ------------------------------");

    let cache: SieveCache<u32, Vec<u8>> = SieveCache::new(16).unwrap();
    cache.put(1, vec![7u8; 64 * 1024]);

    let checksum = cache.get_with(&1, |bytes| bytes.iter().map(|&b| b as u64).sum::<u64>());
    println!("   Checksum of a 64 KiB value: {:?}", checksum);

    let length = cache.get_with(&2, |bytes| bytes.len());
    println!("   Missing key:                {:?}", length);
}

/// Values handed out by get_arc stay valid after their entry is evicted
fn shared_values_survive_eviction() {
    println!("3. Shared Values Outlive Eviction");
    println!("   ------------------------------");

    let cache: SieveCache<&'static str, String> = SieveCache::new(1).unwrap();
    cache.put("report", "quarterly numbers".to_string());
    let held = cache.get_arc(&"report").unwrap();

    cache.put("other", "pushes report out".to_string());
    println!("   report still cached: {}", cache.contains_key(&"report"));
    println!("   held value:          {}", held);
}

/// Throughput of a mixed workload as threads are added
fn throughput_by_thread_count() {
    println!("4. Throughput by Thread Count (80% reads, 20% writes)");
    println!("   --------------------------------------------------");

    const CAPACITY: usize = 10_000;
    const OPS_PER_THREAD: usize = 100_000;

    for num_threads in [1usize, 2, 4, 8] {
        let cache = Arc::new(SieveCache::new(CAPACITY).unwrap());
        for i in 0..CAPACITY {
            cache.put(i, i);
        }

        let start = Instant::now();
        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..OPS_PER_THREAD {
                        let key = (t * 7_919 + i * 31) % (CAPACITY * 2);
                        if i % 5 == 0 {
                            cache.put(key, key);
                        } else {
                            let _ = cache.get(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let elapsed = start.elapsed();

        let total_ops = num_threads * OPS_PER_THREAD;
        let ops_per_sec = total_ops as f64 / elapsed.as_secs_f64();
        info!(num_threads, ?elapsed, "mixed workload finished");
        println!(
            "   {:>2} threads: {:>12.0} ops/sec, hit rate {:.2}%",
            num_threads,
            ops_per_sec,
            cache.stats().hit_rate_percent()
        );
    }
}
