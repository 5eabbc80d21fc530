//! Stress Tests for the SIEVE Cache
//!
//! These tests verify thread safety and structural consistency under high
//! contention. Worker threads come from a scoped pool so they can borrow the
//! cache directly.

use scoped_threadpool::Pool;
use sieve_rs::SieveCache;
use std::sync::atomic::{AtomicUsize, Ordering};

const NUM_THREADS: u32 = 16;
const OPS_PER_THREAD: usize = 10_000;

/// Test high contention with many threads hammering the same keys
#[test]
fn stress_high_contention() {
    let cache: SieveCache<usize, usize> = SieveCache::new(100).unwrap();
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = i % 10; // Only 10 keys for high contention
                    if t % 2 == 0 {
                        cache.put(key, t * OPS_PER_THREAD + i);
                    } else {
                        let _ = cache.get(&key);
                    }
                }
            });
        }
    });

    assert!(cache.len() <= 10);
    assert_eq!(cache.stats().evictions(), 0);
    cache.check_invariants().unwrap();
}

/// Test capacity limits under concurrent insertion of distinct keys
#[test]
fn stress_capacity_limits() {
    let capacity = 100;
    let cache: SieveCache<usize, usize> = SieveCache::new(capacity).unwrap();
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    cache.put(t * OPS_PER_THREAD + i, i);
                }
            });
        }
    });

    assert_eq!(cache.len(), capacity);
    assert_eq!(
        cache.stats().evictions(),
        (NUM_THREADS as usize * OPS_PER_THREAD - capacity) as u64
    );
    cache.check_invariants().unwrap();
}

/// Test edge case: empty cache operations
#[test]
fn stress_empty_cache() {
    let cache: SieveCache<usize, usize> = SieveCache::new(100).unwrap();
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for _ in 0..NUM_THREADS {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..1000 {
                    assert!(cache.get(&i).is_none());
                    assert!(cache.remove(&i).is_none());
                }
            });
        }
    });

    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses(), NUM_THREADS as u64 * 1000);
}

/// Test edge case: single item cache
#[test]
fn stress_single_item_cache() {
    let cache: SieveCache<usize, usize> = SieveCache::new(1).unwrap();
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..1000 {
                    cache.put(t, i);
                    if let Some(value) = cache.get(&t) {
                        assert!(value < 1000);
                    }
                }
            });
        }
    });

    assert_eq!(cache.len(), 1);
    cache.check_invariants().unwrap();
}

/// Test mixed operations including removals and periodic clears
#[test]
fn stress_mixed_operations() {
    let cache: SieveCache<usize, usize> = SieveCache::new(256).unwrap();
    let removed = AtomicUsize::new(0);
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            let removed = &removed;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = (i * 13 + t * 7) % 1024;
                    match i % 10 {
                        0..=3 => cache.put(key, i),
                        4..=7 => {
                            if let Some(value) = cache.get(&key) {
                                assert!(value < OPS_PER_THREAD);
                            }
                        }
                        8 => {
                            if cache.remove(&key).is_some() {
                                removed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        _ => {
                            let _ = cache.contains_key(&key);
                        }
                    }
                    if t == 0 && i % 2_500 == 0 {
                        cache.clear();
                    }
                }
            });
        }
    });

    assert!(cache.len() <= 256);
    assert!(removed.load(Ordering::Relaxed) > 0);
    cache.check_invariants().unwrap();
}

/// Test eviction churn where readers keep re-marking entries behind the hand
#[test]
fn stress_readers_chasing_the_hand() {
    let capacity = 64;
    let cache: SieveCache<usize, usize> = SieveCache::new(capacity).unwrap();
    for key in 0..capacity {
        cache.put(key, key);
    }
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    if t < 4 {
                        cache.put(capacity + t * OPS_PER_THREAD + i, i);
                    } else {
                        // Touch everything that might still be cached.
                        let _ = cache.get(&(i % (capacity * 2)));
                    }
                }
            });
        }
    });

    assert_eq!(cache.len(), capacity);
    assert_eq!(
        cache.stats().evictions(),
        (4 * OPS_PER_THREAD) as u64
    );
    cache.check_invariants().unwrap();
}

/// Test that keys, len and the invariant check agree after heavy churn
#[test]
fn stress_structure_consistency() {
    let cache: SieveCache<String, Vec<u8>> = SieveCache::new(500).unwrap();
    let mut pool = Pool::new(8);

    pool.scoped(|scope| {
        for t in 0..8 {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..5_000 {
                    let key = format!("key_{}", (i * (t + 1)) % 2_000);
                    if i % 3 == 0 {
                        let _ = cache.remove(&key);
                    } else {
                        cache.put(key, vec![t as u8; 8]);
                    }
                }
            });
        }
    });

    let keys = cache.keys();
    assert_eq!(keys.len(), cache.len());
    assert!(keys.len() <= 500);
    for key in &keys {
        let value = cache.get(key).unwrap();
        assert_eq!(value.len(), 8);
    }
    cache.check_invariants().unwrap();
}
