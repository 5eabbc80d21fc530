#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Quick Reference
//!
//! | Operation | Cost | Lock |
//! |-----------|------|------|
//! | [`get`](SieveCache::get), [`get_arc`](SieveCache::get_arc) | O(1) | none |
//! | [`contains_key`](SieveCache::contains_key), [`len`](SieveCache::len) | O(1) | none |
//! | [`put`](SieveCache::put) on a cached key | O(1) | none |
//! | [`put`](SieveCache::put) on a new key | O(1) amortized | structural |
//! | [`remove`](SieveCache::remove) | O(1) | structural |
//! | [`clear`](SieveCache::clear) | O(n) | structural |
//!
//! ## Code Examples
//!
//! ### Second chance
//!
//! ```rust
//! use sieve_rs::SieveCache;
//!
//! let cache = SieveCache::new(2).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");      // "a" is marked visited, nothing moves
//! cache.put("c", 3);    // the hand spares "a" and evicts "b"
//! assert!(cache.get(&"b").is_none());
//! assert_eq!(cache.get(&"a"), Some(1));
//! ```
//!
//! ### Sharing across threads
//!
//! ```rust
//! use sieve_rs::SieveCache;
//! use std::sync::Arc;
//!
//! let cache = Arc::new(SieveCache::new(10_000).unwrap());
//!
//! let cache_clone = Arc::clone(&cache);
//! std::thread::spawn(move || {
//!     cache_clone.put("key".to_string(), 42);
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(cache.get("key"), Some(42));
//! ```
//!
//! ### Statistics
//!
//! ```rust
//! use sieve_rs::SieveCache;
//!
//! let cache = SieveCache::new(1).unwrap();
//! cache.put(1, "one");
//! cache.get(&1);
//! cache.get(&2);
//! cache.put(2, "two");
//!
//! let stats = cache.stats();
//! assert_eq!((stats.hits(), stats.misses(), stats.evictions()), (1, 1, 1));
//! assert_eq!(stats.to_string(), "CacheStats{hits=1, misses=1, evictions=1, hitRate=50.00%, requests=2}");
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber. Evictions
//! are logged at `TRACE`, construction and `clear` at `DEBUG`, and the
//! eviction fallbacks (a hand that no longer refers to a live entry, a sweep
//! that exceeds its step bound) at `WARN`.
//!
//! ## Modules
//!
//! - [`sieve`]: The SIEVE cache implementation
//! - [`config`]: Cache configuration
//! - [`error`]: Configuration and invariant errors
//! - [`metrics`]: Hit, miss and eviction accounting
//! - [`traits`]: Interfaces shared with other cache implementations

/// Cache entry: key, atomically replaceable value and visited bit.
///
/// **Note**: This module is internal infrastructure.
pub(crate) mod entry;

/// Arena-backed doubly linked list used as the recency queue.
///
/// **Note**: This module is internal infrastructure and performs no
/// synchronization of its own.
pub(crate) mod list;

/// Concurrent key to entry index.
pub(crate) mod index;

/// Cache configuration structures.
pub mod config;

/// Error types.
pub mod error;

/// Cache metrics system.
///
/// Provides the stats recorder the cache reports to and a `BTreeMap` based
/// reporting interface.
pub mod metrics;

/// Common cache traits.
pub mod traits;

/// SIEVE cache implementation.
///
/// A fixed-capacity, thread-safe cache that evicts with a sweeping hand and a
/// single visited bit per entry instead of reordering on every hit.
pub mod sieve;

pub use config::SieveCacheConfig;
pub use error::{ConfigError, InvariantError};
pub use metrics::{AtomicStats, CacheStats, StatsRecorder};
pub use sieve::SieveCache;
pub use traits::{Cache, StatisticalCache};
