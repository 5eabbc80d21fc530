//! Correctness Tests for Concurrent Access
//!
//! These tests run real threads against one shared cache and check the
//! guarantees that must hold under any interleaving: a read returns the value
//! of the key it asked for or nothing, counters add up, and the queue, index
//! and hand agree once the threads are joined.

use sieve_rs::SieveCache;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const NUM_THREADS: usize = 8;

fn spawn_all<F>(count: usize, f: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let barrier = Arc::new(Barrier::new(count));
    let handles: Vec<_> = (0..count)
        .map(|t| {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                f(t);
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

#[test]
fn test_concurrent_reads() {
    let cache: Arc<SieveCache<usize, usize>> = Arc::new(SieveCache::new(100).unwrap());
    for key in 0..100 {
        cache.put(key, key * 10);
    }

    let reader = Arc::clone(&cache);
    spawn_all(NUM_THREADS, move |_| {
        for _ in 0..10 {
            for key in 0..100 {
                assert_eq!(reader.get(&key), Some(key * 10));
            }
        }
    });

    let stats = cache.stats();
    assert_eq!(stats.hits(), (NUM_THREADS * 10 * 100) as u64);
    assert_eq!(stats.misses(), 0);
    assert_eq!(stats.evictions(), 0);
}

#[test]
fn test_concurrent_writes_disjoint_keys() {
    let per_thread = 100;
    let cache: Arc<SieveCache<usize, usize>> =
        Arc::new(SieveCache::new(NUM_THREADS * per_thread).unwrap());

    let writer = Arc::clone(&cache);
    spawn_all(NUM_THREADS, move |t| {
        for i in 0..per_thread {
            writer.put(t * per_thread + i, t);
        }
    });

    assert_eq!(cache.len(), NUM_THREADS * per_thread);
    for t in 0..NUM_THREADS {
        for i in 0..per_thread {
            assert_eq!(cache.get(&(t * per_thread + i)), Some(t));
        }
    }
    cache.check_invariants().unwrap();
}

#[test]
fn test_same_key_inserted_once() {
    let cache: Arc<SieveCache<u32, usize>> = Arc::new(SieveCache::new(16).unwrap());

    let writer = Arc::clone(&cache);
    spawn_all(NUM_THREADS, move |t| {
        for key in 0..8 {
            writer.put(key, t);
        }
    });

    assert_eq!(cache.len(), 8);
    assert_eq!(cache.keys().len(), 8);
    assert_eq!(cache.stats().evictions(), 0);
    cache.check_invariants().unwrap();
}

#[test]
fn test_values_never_cross_keys() {
    // Values carry their own key, so a read can verify it got the right one.
    let cache: Arc<SieveCache<u32, (u32, usize)>> = Arc::new(SieveCache::new(50).unwrap());

    let shared = Arc::clone(&cache);
    spawn_all(NUM_THREADS, move |t| {
        for i in 0..2_000u32 {
            let key = i % 80;
            shared.put(key, (key, t));
            if let Some((owner, _)) = shared.get(&key) {
                assert_eq!(owner, key);
            }
            let other = (i * 7) % 80;
            if let Some((owner, _)) = shared.get(&other) {
                assert_eq!(owner, other);
            }
        }
    });

    assert!(cache.len() <= 50);
    cache.check_invariants().unwrap();
}

#[test]
fn test_own_writes_are_visible_or_evicted() {
    let keys_per_thread = 20;
    let cache: Arc<SieveCache<String, String>> = Arc::new(SieveCache::new(50).unwrap());

    let shared = Arc::clone(&cache);
    spawn_all(NUM_THREADS, move |t| {
        for i in 0..keys_per_thread {
            let key = format!("thread{t}_key{i}");
            let value = format!("thread{t}_value{i}");
            shared.put(key.clone(), value.clone());
            if let Some(retrieved) = shared.get(&key) {
                assert_eq!(retrieved, value);
            }
        }
        for i in 0..keys_per_thread {
            let key = format!("thread{t}_key{i}");
            if let Some(retrieved) = shared.get(&key) {
                assert_eq!(retrieved, format!("thread{t}_value{i}"));
            }
        }
    });
}

/// A read racing with the removal of the same key sees the key either present
/// with its value or absent.
#[test]
fn test_get_racing_remove_of_same_key() {
    let cache: Arc<SieveCache<u32, u32>> = Arc::new(SieveCache::new(8).unwrap());
    let done = Arc::new(AtomicBool::new(false));
    let seen_present = Arc::new(AtomicUsize::new(0));

    let writer = {
        let cache = Arc::clone(&cache);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..5_000u32 {
                cache.put(7, 700 + round % 3);
                assert!(cache.remove(&7).is_some());
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            let seen_present = Arc::clone(&seen_present);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    if let Some(value) = cache.get(&7) {
                        assert!((700..703).contains(&value));
                        seen_present.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    writer.join().expect("Thread panicked");
    for reader in readers {
        reader.join().expect("Thread panicked");
    }

    assert!(cache.is_empty());
    assert_eq!(cache.stats().evictions(), 0);
    cache.check_invariants().unwrap();
}

/// A read racing with the eviction of the same key behaves the same way.
#[test]
fn test_get_racing_eviction_of_same_key() {
    let cache: Arc<SieveCache<u32, u32>> = Arc::new(SieveCache::new(4).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let cache = Arc::clone(&cache);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..20_000u32 {
                cache.put(i % 16, (i % 16) * 100);
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|r| {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut key = r;
                while !done.load(Ordering::Acquire) {
                    key = (key + 1) % 16;
                    if let Some(value) = cache.get(&key) {
                        assert_eq!(value, key * 100);
                    }
                }
            })
        })
        .collect();

    writer.join().expect("Thread panicked");
    for reader in readers {
        reader.join().expect("Thread panicked");
    }

    assert_eq!(cache.len(), 4);
    cache.check_invariants().unwrap();
}

#[test]
fn test_alternating_values_seen_only_as_written() {
    let cache: Arc<SieveCache<&'static str, u32>> = Arc::new(SieveCache::new(10).unwrap());
    cache.put("key", 1);

    let shared = Arc::clone(&cache);
    spawn_all(3, move |t| {
        if t == 0 {
            for _ in 0..1_000 {
                shared.put("key", 1);
                shared.put("key", 2);
                shared.put("key", 1);
            }
        } else {
            for _ in 0..3_000 {
                let current = shared.get(&"key");
                assert!(matches!(current, Some(1) | Some(2)));
            }
        }
    });

    assert_eq!(cache.get(&"key"), Some(1));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_stats_add_up_after_concurrent_traffic() {
    let capacity = 64;
    let per_thread = 1_000;
    let cache: Arc<SieveCache<usize, usize>> = Arc::new(SieveCache::new(capacity).unwrap());
    let gets = Arc::new(AtomicUsize::new(0));

    let shared = Arc::clone(&cache);
    let counter = Arc::clone(&gets);
    spawn_all(NUM_THREADS, move |t| {
        for i in 0..per_thread {
            let key = t * per_thread + i;
            shared.put(key, i);
            let _ = shared.get(&key);
            let _ = shared.get(&(key / 2));
            counter.fetch_add(2, Ordering::Relaxed);
        }
    });

    let stats = cache.stats();
    assert_eq!(stats.total_requests(), gets.load(Ordering::Relaxed) as u64);
    assert_eq!(stats.hits() + stats.misses(), stats.total_requests());
    // Every key is distinct, so each insertion past capacity evicted exactly one.
    assert_eq!(
        stats.evictions(),
        (NUM_THREADS * per_thread - capacity) as u64
    );
    assert_eq!(cache.len(), capacity);
}

#[test]
fn test_invariants_after_mixed_churn() {
    let cache: Arc<SieveCache<u32, u32>> = Arc::new(SieveCache::new(32).unwrap());

    let shared = Arc::clone(&cache);
    spawn_all(NUM_THREADS, move |t| {
        let t = t as u32;
        for i in 0..2_000u32 {
            let key = (i * 31 + t * 17) % 96;
            match i % 5 {
                0 | 1 => shared.put(key, i),
                2 | 3 => {
                    let _ = shared.get(&key);
                }
                _ => {
                    let _ = shared.remove(&key);
                }
            }
            if t == 0 && i % 500 == 499 {
                shared.clear();
            }
        }
    });

    assert!(cache.len() <= 32);
    cache.check_invariants().unwrap();

    let keys: HashSet<u32> = cache.keys().into_iter().collect();
    assert_eq!(keys.len(), cache.len());
    for key in keys {
        assert!(cache.contains_key(&key));
    }
}

#[test]
fn test_shared_values_outlive_eviction() {
    let cache: Arc<SieveCache<u32, Vec<u8>>> = Arc::new(SieveCache::new(2).unwrap());
    cache.put(1, vec![1; 1024]);
    let held = cache.get_arc(&1).unwrap();

    let writer = Arc::clone(&cache);
    spawn_all(4, move |t| {
        for i in 0..500u32 {
            writer.put(10 + t as u32 * 1000 + i, vec![0; 16]);
        }
    });

    assert!(!cache.contains_key(&1));
    assert_eq!(held.len(), 1024);
    assert!(held.iter().all(|&b| b == 1));
}

#[test]
fn test_len_never_exceeds_capacity_during_evictions() {
    const CAPACITY: usize = 8;
    const READERS: usize = 3;

    let cache: Arc<SieveCache<u64, u64>> = Arc::new(SieveCache::new(CAPACITY).unwrap());
    let done = Arc::new(AtomicBool::new(false));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            let max_seen = Arc::clone(&max_seen);
            thread::spawn(move || {
                let mut observed = 0usize;
                while !done.load(Ordering::Acquire) {
                    observed = observed.max(cache.len());
                }
                max_seen.fetch_max(observed, Ordering::Relaxed);
            })
        })
        .collect();

    // Every put of a fresh key past capacity evicts, so the shard holding
    // the victim and the shard receiving the new key change constantly.
    for key in 0..500_000u64 {
        cache.put(key, key);
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().expect("Reader panicked");
    }

    let max_seen = max_seen.load(Ordering::Relaxed);
    assert!(
        max_seen <= CAPACITY,
        "observed len {max_seen} with capacity {CAPACITY}"
    );
    assert_eq!(cache.len(), CAPACITY);
    cache.check_invariants().unwrap();
}
