//! SIEVE Cache Implementation
//!
//! SIEVE keeps entries in plain insertion order and gives each one a single
//! "visited" bit. A hand sweeps the queue from the oldest entry toward the
//! newest, clearing visited bits as it goes, and evicts the first entry it
//! finds unvisited. Entries that were touched since the hand last passed get a
//! second chance without ever being moved.
//!
//! # How the Algorithm Works
//!
//! ```text
//!   head (newest)                              tail (oldest)
//!   ┌─────┐    ┌─────┐    ┌─────┐    ┌─────┐
//!   │  E  │ ── │  D  │ ── │  C  │ ── │  B  │ ── ...
//!   │ v=0 │    │ v=1 │    │ v=0 │    │ v=1 │
//!   └─────┘    └─────┘    └─────┘    └─────┘
//!                            ▲
//!                           hand
//! ```
//!
//! - **Hit**: set `v = 1`. Nothing moves and no lock is taken.
//! - **Insert**: link the new entry at the head with `v = 0`.
//! - **Evict**: starting at the hand, clear `v` on each visited entry and step
//!   toward the head, wrapping to the tail past the head. The first entry with
//!   `v = 0` is evicted and the hand rests on its newer neighbour.
//!
//! Because a hit never reorders the queue, reads need no structural lock at
//! all, which is where SIEVE gains over LRU under concurrent load.
//!
//! # Concurrency
//!
//! State is split into two domains:
//!
//! - **Lock-free**: index lookups, visited-bit updates and in-place value
//!   replacement. `get` and `put` on an existing key only touch this domain.
//! - **Structural**: the recency queue and the hand, behind one
//!   `parking_lot::Mutex`. Inserting a new key, evicting, removing and
//!   clearing are serialized through it, and every change to index membership
//!   happens while it is held.
//!
//! A `get` racing with the eviction or removal of the same key reports the key
//! either present with its value or absent. It never returns another key's
//! value: values are published through an atomic pointer swap and the entry
//! is kept alive by reference counting for as long as a reader holds it.
//!
//! # Example
//!
//! ```
//! use sieve_rs::SieveCache;
//!
//! let cache = SieveCache::new(3).unwrap();
//! cache.put(1, "one");
//! cache.put(2, "two");
//! cache.put(3, "three");
//!
//! // Give 1 and 2 a second chance.
//! cache.get(&1);
//! cache.get(&2);
//!
//! // 3 was never read, so it goes first.
//! cache.put(4, "four");
//! assert!(!cache.contains_key(&3));
//! assert_eq!(cache.len(), 3);
//! ```

use crate::config::SieveCacheConfig;
use crate::entry::Entry;
use crate::error::{ConfigError, InvariantError};
use crate::index::Index;
use crate::list::{List, Slot};
use crate::metrics::{AtomicStats, CacheMetrics, CacheStats, StatsRecorder};
use crate::traits::{Cache, StatisticalCache};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// Upper bound on sweep steps per eviction, as a multiple of the queue length.
///
/// A sweep over an undisturbed queue ends within `len + 1` steps. Readers
/// setting visited bits behind the hand can stretch it; past this bound the
/// current candidate is evicted regardless of its bit.
const SWEEP_LIMIT_FACTOR: usize = 3;

/// Queue topology guarded by the structural lock.
struct SieveState<K, V> {
    list: List<Arc<Entry<K, V>>>,
    /// Where the next eviction sweep starts. `None` means "at the tail".
    hand: Option<Slot>,
}

impl<K, V> SieveState<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        SieveState {
            list: List::with_capacity(capacity),
            hand: None,
        }
    }

    /// The position following `slot` in sweep order: its newer neighbour, or
    /// the tail when `slot` is the head.
    fn sweep_next(&self, slot: Slot) -> Option<Slot> {
        self.list.newer(slot).or_else(|| self.list.tail())
    }

    /// Unlinks `slot` and returns its entry together with the position that
    /// followed it in sweep order, as seen after the unlink.
    fn unlink(&mut self, slot: Slot) -> Option<(Arc<Entry<K, V>>, Option<Slot>)> {
        let newer = self.list.newer(slot);
        let entry = self.list.remove(slot)?;
        Some((entry, newer.or_else(|| self.list.tail())))
    }
}

/// A thread-safe, fixed-capacity cache with SIEVE eviction.
///
/// All operations take `&self`; share the cache between threads with an
/// `Arc`.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone`.
/// - `V`: Value type. Operations that hand out an owned value need `V: Clone`;
///   [`get_arc`](Self::get_arc) and [`get_with`](Self::get_with) do not.
/// - `R`: Stats recorder. Defaults to [`AtomicStats`].
/// - `S`: Hash builder type. Defaults to `DefaultHashBuilder`.
///
/// # Example
///
/// ```
/// use sieve_rs::SieveCache;
/// use std::sync::Arc;
/// use std::thread;
///
/// let cache = Arc::new(SieveCache::new(100).unwrap());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let cache = Arc::clone(&cache);
///         thread::spawn(move || {
///             for i in 0..50 {
///                 cache.put(t * 1000 + i, i);
///                 cache.get(&(t * 1000 + i));
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(cache.len(), 100);
/// assert!(cache.check_invariants().is_ok());
/// ```
pub struct SieveCache<K, V, R = AtomicStats, S = DefaultHashBuilder> {
    index: Index<K, V, S>,
    state: Mutex<SieveState<K, V>>,
    /// Mirrors the queue length. Written only under the structural lock.
    len: AtomicUsize,
    stats: Arc<R>,
    capacity: NonZeroUsize,
}

impl<K, V> SieveCache<K, V, AtomicStats, DefaultHashBuilder>
where
    K: Hash + Eq + Clone,
{
    /// Creates a new SIEVE cache from a configuration with an optional hasher.
    ///
    /// This is the **recommended** way to create a SIEVE cache.
    ///
    /// # Example
    ///
    /// ```
    /// use sieve_rs::config::SieveCacheConfig;
    /// use sieve_rs::SieveCache;
    ///
    /// let config = SieveCacheConfig::new(1024).unwrap();
    /// let cache: SieveCache<String, u64> = SieveCache::init(config, None);
    /// assert!(cache.is_empty());
    /// ```
    pub fn init(config: SieveCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::with_stats_and_hasher(
            config,
            Arc::new(AtomicStats::new()),
            hasher.unwrap_or_default(),
        )
    }

    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        SieveCacheConfig::new(capacity).map(|config| Self::init(config, None))
    }
}

impl<K, V, R> SieveCache<K, V, R, DefaultHashBuilder>
where
    K: Hash + Eq + Clone,
    R: StatsRecorder,
{
    /// Creates a cache that reports hits, misses and evictions to `stats`.
    pub fn with_stats(config: SieveCacheConfig, stats: Arc<R>) -> Self {
        Self::with_stats_and_hasher(config, stats, DefaultHashBuilder::default())
    }
}

impl<K, V, R, S> SieveCache<K, V, R, S>
where
    K: Hash + Eq + Clone,
    R: StatsRecorder,
    S: BuildHasher + Clone,
{
    /// Creates a cache with a custom stats recorder and hash builder.
    ///
    /// Use this for deterministic hashing or DoS-resistant hashers.
    pub fn with_stats_and_hasher(config: SieveCacheConfig, stats: Arc<R>, hash_builder: S) -> Self {
        let capacity = config.capacity();
        debug!(capacity = capacity.get(), "creating SIEVE cache");
        SieveCache {
            index: Index::with_capacity_and_hasher(capacity.get(), hash_builder),
            state: Mutex::new(SieveState::with_capacity(capacity.get())),
            len: AtomicUsize::new(0),
            stats,
            capacity,
        }
    }

    /// Returns the maximum number of entries the cache can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns the number of live entries.
    ///
    /// The count changes once per structural operation, so no reader ever
    /// observes more than [`capacity`](Self::capacity) entries, even while
    /// evictions are in flight.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the next insertion of a new key will evict.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Retrieves a value and returns the shared handle to it.
    ///
    /// A hit marks the entry visited and records a hit; a miss records a miss.
    /// No lock is taken.
    pub fn get_arc<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.index.lookup(key) {
            Some(entry) => {
                entry.mark_visited();
                self.stats.record_hit();
                Some(entry.load())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Retrieves a value and applies `f` to it.
    ///
    /// Avoids cloning the value when only part of it is needed.
    ///
    /// # Example
    ///
    /// ```
    /// use sieve_rs::SieveCache;
    ///
    /// let cache = SieveCache::new(4).unwrap();
    /// cache.put("key", String::from("hello world"));
    /// assert_eq!(cache.get_with(&"key", |v| v.len()), Some(11));
    /// assert_eq!(cache.get_with(&"missing", |v| v.len()), None);
    /// ```
    pub fn get_with<Q, F, T>(&self, key: &Q, f: F) -> Option<T>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> T,
    {
        self.get_arc(key).map(|value| f(&value))
    }

    /// Retrieves a **clone** of the value cached under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.get_arc(key).map(|value| V::clone(&value))
    }

    /// Returns `true` if `key` is cached.
    ///
    /// Unlike [`get`](Self::get) this neither marks the entry visited nor
    /// counts as a request.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains(key)
    }

    /// Inserts or replaces the value for `key`.
    ///
    /// Replacing the value of a cached key marks it visited and takes no lock.
    /// Inserting a new key takes the structural lock, evicts while the cache
    /// is full, and links the new entry at the head, unvisited.
    ///
    /// An update that races with the eviction of the same key lands on the
    /// outgoing entry and is dropped with it, exactly as if the eviction had
    /// run just after the update.
    pub fn put(&self, key: K, value: V) {
        if let Some(entry) = self.index.lookup(&key) {
            entry.update(value);
            return;
        }

        let mut state = self.state.lock();

        // Another thread may have inserted the key while we waited.
        if let Some(entry) = self.index.lookup(&key) {
            entry.update(value);
            return;
        }

        while state.list.len() >= self.capacity.get() {
            if !self.evict(&mut state) {
                warn!(len = state.list.len(), "eviction found nothing to evict");
                break;
            }
        }

        let slot = state.list.next_slot();
        let entry = Arc::new(Entry::new(key.clone(), value, slot));
        let linked = state.list.push_front(Arc::clone(&entry));
        debug_assert_eq!(linked, slot);
        self.index.insert(key, entry);
        self.sync_len(&state);
    }

    /// Removes `key` and returns its value.
    ///
    /// Does not count as an eviction.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let mut state = self.state.lock();
        let entry = self.index.remove(key)?;

        let slot = entry.slot();
        if let Some((unlinked, next)) = state.unlink(slot) {
            debug_assert!(Arc::ptr_eq(&unlinked, &entry));
            if state.hand == Some(slot) {
                state.hand = next;
            }
        }
        self.sync_len(&state);
        drop(state);

        Some(entry.into_value())
    }

    /// Removes every entry and resets the statistics.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        self.index.clear();
        state.list.clear();
        state.hand = None;
        self.sync_len(&state);
        self.stats.reset();
        debug!(capacity = self.capacity.get(), "cache cleared");
    }

    /// Returns a snapshot of the hit, miss and eviction counters.
    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Resets the counters without touching cached entries.
    #[inline]
    pub fn clear_stats(&self) {
        self.stats.reset();
    }

    /// Returns the recorder this cache reports to.
    #[inline]
    pub fn stats_recorder(&self) -> &Arc<R> {
        &self.stats
    }

    /// Returns the cached keys from newest to oldest.
    pub fn keys(&self) -> Vec<K> {
        let state = self.state.lock();
        state
            .list
            .iter()
            .map(|(_, entry)| entry.key().clone())
            .collect()
    }

    /// Returns the key the next eviction sweep starts from, if the hand has
    /// been placed.
    pub fn hand_key(&self) -> Option<K> {
        let state = self.state.lock();
        state
            .hand
            .and_then(|slot| state.list.get(slot))
            .map(|entry| entry.key().clone())
    }

    /// Verifies that the recency queue, the lookup index and the hand agree.
    ///
    /// Checks that:
    /// - the queue links form a single chain from head to tail,
    /// - the queue, the index and the reported length agree, and never exceed
    ///   the capacity,
    /// - every queued entry is the one the index holds for its key and sits
    ///   at the slot it records,
    /// - the hand, when placed, refers to a queued entry.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let state = self.state.lock();
        state.list.check_links()?;

        let queued = state.list.len();
        let indexed = self.index.len();
        if queued != indexed {
            return Err(InvariantError::new(format!(
                "queue holds {queued} entries but index holds {indexed}"
            )));
        }
        let reported = self.len();
        if reported != queued {
            return Err(InvariantError::new(format!(
                "len reports {reported} entries but queue holds {queued}"
            )));
        }
        if queued > self.capacity.get() {
            return Err(InvariantError::new(format!(
                "{queued} entries exceed capacity {}",
                self.capacity
            )));
        }

        for (slot, entry) in state.list.iter() {
            if entry.slot() != slot {
                return Err(InvariantError::new(format!(
                    "entry at slot {slot} records slot {}",
                    entry.slot()
                )));
            }
            if !self.index.holds(entry) {
                return Err(InvariantError::new(format!(
                    "entry at slot {slot} is queued but not indexed"
                )));
            }
        }

        if let Some(hand) = state.hand {
            if !state.list.contains(hand) {
                return Err(InvariantError::new(format!(
                    "hand references empty slot {hand}"
                )));
            }
        }
        Ok(())
    }

    /// Evicts exactly one entry. Structural lock must be held.
    ///
    /// Returns `false` only if the queue is empty.
    fn evict(&self, state: &mut SieveState<K, V>) -> bool {
        let max_steps = state.list.len().saturating_mul(SWEEP_LIMIT_FACTOR);
        self.evict_within(state, max_steps)
    }

    fn evict_within(&self, state: &mut SieveState<K, V>, max_steps: usize) -> bool {
        debug_assert!(self.state.is_locked());

        let Some(mut candidate) = self.sweep_start(state) else {
            return false;
        };

        for _ in 0..max_steps {
            let Some(entry) = state.list.get(candidate) else {
                break;
            };
            if !entry.clear_visited() {
                return self.evict_slot(state, candidate);
            }
            match state.sweep_next(candidate) {
                Some(next) => candidate = next,
                None => break,
            }
        }

        warn!(
            steps = max_steps,
            slot = candidate,
            "eviction sweep found no victim; forcing eviction"
        );
        if self.evict_slot(state, candidate) {
            return true;
        }
        match state.list.tail() {
            Some(tail) => self.evict_slot(state, tail),
            None => false,
        }
    }

    /// Returns the slot the sweep starts from, re-placing the hand at the tail
    /// if it is unset or no longer refers to a live entry.
    fn sweep_start(&self, state: &mut SieveState<K, V>) -> Option<Slot> {
        if let Some(hand) = state.hand {
            match state.list.get(hand) {
                Some(entry) if self.index.holds(entry) => return Some(hand),
                _ => warn!(slot = hand, "hand references a dead entry; restarting at tail"),
            }
        }
        state.hand = state.list.tail();
        state.hand
    }

    /// Drops the entry at `slot` from the index and the queue, moves the hand
    /// past it and records the eviction.
    ///
    /// A queued entry missing from the index is unlinked to free its slot but
    /// is not counted as an eviction.
    fn evict_slot(&self, state: &mut SieveState<K, V>, slot: Slot) -> bool {
        let Some(entry) = state.list.get(slot) else {
            return false;
        };
        let indexed = self.index.remove_entry(entry);

        let Some((_, next)) = state.unlink(slot) else {
            return false;
        };
        state.hand = next;
        self.sync_len(state);
        if indexed {
            self.stats.record_eviction();
            trace!(slot, remaining = state.list.len(), "evicted entry");
        } else {
            warn!(slot, "queued entry was not indexed; unlinked without eviction");
        }
        true
    }

    /// Publishes the queue length. Structural lock must be held.
    #[inline]
    fn sync_len(&self, state: &SieveState<K, V>) {
        self.len.store(state.list.len(), Ordering::Release);
    }

    #[cfg(test)]
    fn place_hand(&self, slot: Option<Slot>) {
        self.state.lock().hand = slot;
    }
}

impl<K, V, R, S> Cache<K, V> for SieveCache<K, V, R, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    R: StatsRecorder,
    S: BuildHasher + Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        SieveCache::get(self, key)
    }

    fn put(&self, key: K, value: V) {
        SieveCache::put(self, key, value)
    }

    fn remove(&self, key: &K) -> Option<V> {
        SieveCache::remove(self, key)
    }

    fn len(&self) -> usize {
        SieveCache::len(self)
    }

    fn capacity(&self) -> usize {
        SieveCache::capacity(self)
    }

    fn clear(&self) {
        SieveCache::clear(self)
    }

    fn contains_key(&self, key: &K) -> bool {
        SieveCache::contains_key(self, key)
    }
}

impl<K, V, R, S> StatisticalCache<K, V> for SieveCache<K, V, R, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    R: StatsRecorder,
    S: BuildHasher + Clone,
{
    fn stats(&self) -> CacheStats {
        SieveCache::stats(self)
    }

    fn clear_stats(&self) {
        SieveCache::clear_stats(self)
    }
}

impl<K, V, R, S> CacheMetrics for SieveCache<K, V, R, S>
where
    K: Hash + Eq + Clone,
    R: StatsRecorder,
    S: BuildHasher + Clone,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.stats().to_btreemap();
        metrics.insert("capacity".to_string(), self.capacity() as f64);
        metrics.insert("len".to_string(), self.len() as f64);
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "SIEVE"
    }
}

impl<K, V, R, S> fmt::Debug for SieveCache<K, V, R, S>
where
    K: Hash + Eq + Clone,
    R: StatsRecorder,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SieveCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

/// Dumps the full cache state, newest entry first.
///
/// ```text
/// SieveCache State:
/// Size: 2/3
/// Stats: CacheStats{hits=1, misses=0, evictions=0, hitRate=100.00%, requests=1}
/// Head: 2/"b"
/// Tail: 1/"a"
/// Hand: none
/// Cache Elements (from head to tail):
/// [Key: 2, Value: "b", Visited: false, Newer: none, Older: 1]
/// [Key: 1, Value: "a", Visited: true, Newer: 2, Older: none]
/// ```
impl<K, V, R, S> fmt::Display for SieveCache<K, V, R, S>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: fmt::Debug,
    R: StatsRecorder,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        let list = &state.list;

        let describe = |slot: Option<Slot>| match slot.and_then(|s| list.get(s)) {
            Some(entry) => format!("{:?}/{:?}", entry.key(), entry.load()),
            None => "none".to_string(),
        };
        let key_at = |slot: Option<Slot>| match slot.and_then(|s| list.get(s)) {
            Some(entry) => format!("{:?}", entry.key()),
            None => "none".to_string(),
        };

        writeln!(f, "SieveCache State:")?;
        writeln!(f, "Size: {}/{}", self.len(), self.capacity)?;
        writeln!(f, "Stats: {}", self.stats())?;
        writeln!(f, "Head: {}", describe(list.head()))?;
        writeln!(f, "Tail: {}", describe(list.tail()))?;
        writeln!(f, "Hand: {}", describe(state.hand))?;
        writeln!(f, "Cache Elements (from head to tail):")?;
        for (slot, entry) in list.iter() {
            writeln!(
                f,
                "[Key: {:?}, Value: {:?}, Visited: {}, Newer: {}, Older: {}]",
                entry.key(),
                entry.load(),
                entry.is_visited(),
                key_at(list.newer(slot)),
                key_at(list.older(slot)),
            )?;
        }
        Ok(())
    }
}
