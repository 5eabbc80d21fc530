//! Simulation runner for cache algorithms
//!
//! This module replays one synthetic trace against each selected cache, in
//! each selected mode, and collects hit rates and operation latencies.
//!
//! Every cache is driven through the [`sieve_rs::Cache`] trait. The `lru`
//! crate needs `&mut self` and is therefore wrapped in a mutex, while moka and
//! SIEVE are shared directly.
//!
//! In threaded mode the trace is striped across workers (worker `t` replays
//! requests `t`, `t + n`, `t + 2n`, ...), so the combined request order stays
//! close to the sequential one.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Instant;

use ahash::RandomState as AHashRandomState;
use moka::sync::Cache as MokaCache;
use parking_lot::Mutex;
use rand::Rng;
use sieve_rs::{Cache, SieveCache};
use tracing::{info, warn};

use crate::generator::WorkloadGenerator;
use crate::models::{
    CacheAlgorithm, CacheMode, LatencyPercentiles, LatencyStats, OpLatencyStats, Request,
    SimulationConfig, SimulationKey, SimulationResult,
};
use crate::stats::SimulationStats;

/// Maximum latency samples kept per operation type for percentiles
const MAX_LATENCY_SAMPLES: usize = 5_000;

/// `lru::LruCache` behind a mutex so it can be shared like the other caches
pub struct LruBaseline {
    inner: Mutex<lru::LruCache<String, u32>>,
}

impl LruBaseline {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(lru::LruCache::new(capacity)),
        }
    }
}

impl Cache<String, u32> for LruBaseline {
    fn get(&self, key: &String) -> Option<u32> {
        self.inner.lock().get(key).copied()
    }

    fn put(&self, key: String, value: u32) {
        self.inner.lock().put(key, value);
    }

    fn remove(&self, key: &String) -> Option<u32> {
        self.inner.lock().pop(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }

    fn contains_key(&self, key: &String) -> bool {
        self.inner.lock().contains(key)
    }
}

/// `moka::sync::Cache` bounded by entry count
pub struct MokaBaseline {
    inner: MokaCache<String, u32, AHashRandomState>,
    capacity: usize,
}

impl MokaBaseline {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(capacity.get() as u64)
            .initial_capacity(capacity.get())
            .build_with_hasher(AHashRandomState::default());
        Self {
            inner,
            capacity: capacity.get(),
        }
    }
}

impl Cache<String, u32> for MokaBaseline {
    fn get(&self, key: &String) -> Option<u32> {
        self.inner.get(key)
    }

    fn put(&self, key: String, value: u32) {
        self.inner.insert(key, value);
    }

    fn remove(&self, key: &String) -> Option<u32> {
        self.inner.remove(key)
    }

    // Moka applies evictions lazily; flush them so the count is current.
    fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
    }

    fn contains_key(&self, key: &String) -> bool {
        self.inner.contains_key(key)
    }
}

/// One cache under test
pub enum SimCache {
    Sieve(SieveCache<String, u32>),
    Lru(LruBaseline),
    Moka(MokaBaseline),
}

impl SimCache {
    /// Create the cache for `algorithm` holding at most `capacity` entries
    pub fn create(algorithm: CacheAlgorithm, capacity: NonZeroUsize) -> Self {
        match algorithm {
            CacheAlgorithm::Sieve => {
                let config = sieve_rs::SieveCacheConfig::from_capacity(capacity);
                SimCache::Sieve(SieveCache::init(config, None))
            }
            CacheAlgorithm::Lru => SimCache::Lru(LruBaseline::new(capacity)),
            CacheAlgorithm::Moka => SimCache::Moka(MokaBaseline::new(capacity)),
        }
    }

    pub fn as_cache(&self) -> &(dyn Cache<String, u32> + Send + Sync) {
        match self {
            SimCache::Sieve(c) => c,
            SimCache::Lru(c) => c,
            SimCache::Moka(c) => c,
        }
    }

    /// Evictions counted by the cache itself, if it keeps such a counter
    pub fn evictions(&self) -> Option<u64> {
        match self {
            SimCache::Sieve(c) => Some(c.stats().evictions()),
            SimCache::Lru(_) | SimCache::Moka(_) => None,
        }
    }

    /// Run the cache's own consistency check, where it has one
    pub fn verify(&self) -> Result<(), String> {
        match self {
            SimCache::Sieve(c) => c.check_invariants().map_err(|e| e.to_string()),
            SimCache::Lru(_) | SimCache::Moka(_) => Ok(()),
        }
    }
}

/// Tracks latency for a single operation type
#[derive(Debug)]
struct OpLatencyTracker {
    /// Total time spent (nanoseconds)
    total_ns: u64,
    /// Number of operations
    count: u64,
    /// Minimum latency (nanoseconds)
    min_ns: u64,
    /// Maximum latency (nanoseconds)
    max_ns: u64,
    /// Sample reservoir for percentile calculation
    samples: Vec<u64>,
}

impl OpLatencyTracker {
    fn new() -> Self {
        Self {
            total_ns: 0,
            count: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            samples: Vec::with_capacity(MAX_LATENCY_SAMPLES),
        }
    }

    #[inline]
    fn record<R: Rng>(&mut self, latency_ns: u64, rng: &mut R) {
        self.total_ns += latency_ns;
        self.count += 1;
        self.min_ns = self.min_ns.min(latency_ns);
        self.max_ns = self.max_ns.max(latency_ns);

        // Reservoir sampling for percentiles
        if self.samples.len() < MAX_LATENCY_SAMPLES {
            self.samples.push(latency_ns);
        } else {
            let idx = rng.gen_range(0..self.count) as usize;
            if idx < MAX_LATENCY_SAMPLES {
                self.samples[idx] = latency_ns;
            }
        }
    }

    /// Fold another worker's measurements into this one
    fn merge(&mut self, other: OpLatencyTracker) {
        self.total_ns += other.total_ns;
        self.count += other.count;
        self.min_ns = self.min_ns.min(other.min_ns);
        self.max_ns = self.max_ns.max(other.max_ns);
        let room = MAX_LATENCY_SAMPLES.saturating_sub(self.samples.len());
        self.samples.extend(other.samples.into_iter().take(room));
    }

    fn percentiles(&mut self) -> LatencyPercentiles {
        if self.samples.is_empty() {
            return LatencyPercentiles::default();
        }

        self.samples.sort_unstable();
        let len = self.samples.len();

        LatencyPercentiles {
            p50_ns: self.samples[len * 50 / 100],
            p90_ns: self.samples[len * 90 / 100],
            p99_ns: self.samples[len * 99 / 100],
            p999_ns: self.samples[len.saturating_sub(1).min(len * 999 / 1000)],
        }
    }

    fn finalize_op_stats(&mut self) -> OpLatencyStats {
        OpLatencyStats {
            total_ns: self.total_ns,
            count: self.count,
            min_ns: if self.min_ns == u64::MAX {
                0
            } else {
                self.min_ns
            },
            max_ns: self.max_ns,
            percentiles: Some(self.percentiles()),
        }
    }
}

/// Tracks latency of cache operations (get/put)
#[derive(Debug)]
struct LatencyTracker {
    get_tracker: OpLatencyTracker,
    put_tracker: OpLatencyTracker,
}

impl LatencyTracker {
    fn new() -> Self {
        Self {
            get_tracker: OpLatencyTracker::new(),
            put_tracker: OpLatencyTracker::new(),
        }
    }

    fn merge(&mut self, other: LatencyTracker) {
        self.get_tracker.merge(other.get_tracker);
        self.put_tracker.merge(other.put_tracker);
    }

    /// Convert to LatencyStats (consumes internal state)
    fn finalize_stats(&mut self) -> LatencyStats {
        LatencyStats {
            total_ns: self.get_tracker.total_ns + self.put_tracker.total_ns,
            count: self.get_tracker.count + self.put_tracker.count,
            get_stats: self.get_tracker.finalize_op_stats(),
            put_stats: self.put_tracker.finalize_op_stats(),
        }
    }
}

/// Outcome of replaying part of the trace on one thread
#[derive(Debug)]
struct ReplayOutcome {
    hits: usize,
    misses: usize,
    latency: LatencyTracker,
}

impl ReplayOutcome {
    fn empty() -> Self {
        Self {
            hits: 0,
            misses: 0,
            latency: LatencyTracker::new(),
        }
    }

    fn merge(&mut self, other: ReplayOutcome) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.latency.merge(other.latency);
    }
}

/// Look every request up and fill it in on a miss, timing each operation
fn replay<'a, I>(cache: &dyn Cache<String, u32>, requests: I) -> ReplayOutcome
where
    I: IntoIterator<Item = &'a Request>,
{
    let mut rng = rand::thread_rng();
    let mut outcome = ReplayOutcome::empty();

    for request in requests {
        let get_start = Instant::now();
        let hit = cache.get(&request.key).is_some();
        let get_ns = get_start.elapsed().as_nanos() as u64;
        outcome.latency.get_tracker.record(get_ns, &mut rng);

        if hit {
            outcome.hits += 1;
        } else {
            outcome.misses += 1;
            let put_start = Instant::now();
            cache.put(request.key.clone(), request.value);
            let put_ns = put_start.elapsed().as_nanos() as u64;
            outcome.latency.put_tracker.record(put_ns, &mut rng);
        }
    }

    outcome
}

/// Replay the trace striped across `threads` workers sharing one cache
fn replay_threaded(
    cache: &(dyn Cache<String, u32> + Send + Sync),
    trace: &[Request],
    threads: usize,
) -> Result<ReplayOutcome, String> {
    let threads = threads.max(1);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| scope.spawn(move || replay(cache, trace.iter().skip(t).step_by(threads))))
            .collect();

        let mut combined = ReplayOutcome::empty();
        for handle in handles {
            let outcome = handle
                .join()
                .map_err(|_| "simulation worker panicked".to_string())?;
            combined.merge(outcome);
        }
        Ok(combined)
    })
}

/// Runner for cache simulations
pub struct SimulationRunner {
    config: SimulationConfig,
}

impl SimulationRunner {
    /// Create a new simulation runner
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Generate the trace once and replay it for every algorithm and mode
    pub fn run(&self) -> Result<SimulationResult, String> {
        let capacity = NonZeroUsize::new(self.config.capacity)
            .ok_or_else(|| "cache capacity must be positive".to_string())?;

        let generator = WorkloadGenerator::new(self.config.workload.clone())?;
        println!("Generating {} trace...", self.config.workload.workload);
        let trace = generator.generate();
        if trace.is_empty() {
            return Err("workload produced no requests".to_string());
        }

        let unique_objects = trace
            .iter()
            .map(|r| r.value)
            .collect::<HashSet<_>>()
            .len();

        println!("\nDataset statistics:");
        println!("  Total requests: {}", trace.len());
        println!("  Unique objects: {}", unique_objects);
        println!(
            "  Avg requests per object: {:.2}",
            trace.len() as f64 / unique_objects as f64
        );
        println!("\nSimulation configuration:");
        println!("  Cache capacity: {} entries", capacity);
        println!(
            "  Modes: {:?}",
            self.config
                .modes
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
        );
        if self.config.modes.contains(&CacheMode::Threaded) {
            println!("  Worker threads: {}", self.config.thread_count);
        }

        let mut stats = SimulationStats::new(&self.config.algorithms, &self.config.modes);
        let start_time = Instant::now();

        for &algo in &self.config.algorithms {
            for &mode in &self.config.modes {
                let key = SimulationKey::new(algo, mode);
                println!("\nRunning {key}...");
                info!(%key, capacity = capacity.get(), "starting run");

                // One cache at a time, dropped at the end of the iteration
                let cache = SimCache::create(algo, capacity);

                let run_start = Instant::now();
                let mut outcome = match mode {
                    CacheMode::Sequential => replay(cache.as_cache(), &trace),
                    CacheMode::Threaded => {
                        replay_threaded(cache.as_cache(), &trace, self.config.thread_count)?
                    }
                };
                let run_duration = run_start.elapsed();

                if let Err(err) = cache.verify() {
                    warn!(%key, error = %err, "cache failed its consistency check");
                }

                let latency = outcome.latency.finalize_stats();
                stats.record_outcome(key, outcome.hits, outcome.misses);
                stats.record_cache_state(key, cache.evictions(), cache.as_cache().len());
                stats.record_time(key, run_duration.as_millis() as u64);
                stats.record_latency(key, latency.clone());

                println!(
                    "  Wall time: {:.2?} ({:.0} req/s)",
                    run_duration,
                    trace.len() as f64 / run_duration.as_secs_f64()
                );
                print_op_line("GET", &latency.get_stats);
                if latency.put_stats.count > 0 {
                    print_op_line("PUT", &latency.put_stats);
                }
                info!(%key, hits = outcome.hits, misses = outcome.misses, "finished run");
            }
        }

        let duration = start_time.elapsed();

        stats.print_summary();
        if self.config.modes.len() > 1 {
            stats.print_comparison();
        }

        Ok(stats.result(duration, unique_objects, capacity.get()))
    }
}

fn print_op_line(label: &str, op: &OpLatencyStats) {
    println!(
        "    {label}:  {} ops in {:.3}s = {:.0} ops/s | avg={:.0}ns min={} max={} p50={} p99={}",
        op.count,
        op.duration_secs(),
        op.ops_per_sec(),
        op.avg_ns(),
        op.min_ns,
        op.max_ns,
        op.p50_ns(),
        op.p99_ns()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Workload, WorkloadConfig};

    fn small_config(algorithms: Vec<CacheAlgorithm>, modes: Vec<CacheMode>) -> SimulationConfig {
        SimulationConfig {
            workload: WorkloadConfig {
                workload: Workload::Zipfian,
                requests: 5_000,
                key_space: 500,
                ..WorkloadConfig::default()
            },
            capacity: 50,
            algorithms,
            modes,
            thread_count: 4,
        }
    }

    #[test]
    fn test_baselines_behave_like_caches() {
        let capacity = NonZeroUsize::new(2).unwrap();
        for algo in CacheAlgorithm::all() {
            let cache = SimCache::create(algo, capacity);
            let c = cache.as_cache();
            c.put("a".to_string(), 1);
            assert_eq!(c.get(&"a".to_string()), Some(1), "{}", algo.as_str());
            assert!(c.contains_key(&"a".to_string()));
            assert_eq!(c.remove(&"a".to_string()), Some(1));
            assert!(c.is_empty());
            assert_eq!(c.capacity(), 2);
        }
    }

    #[test]
    fn test_sequential_replay_counts_every_request() {
        let trace: Vec<Request> = [1, 2, 1, 3, 1, 2].into_iter().map(Request::for_object).collect();
        let cache = SimCache::create(CacheAlgorithm::Sieve, NonZeroUsize::new(8).unwrap());

        let outcome = replay(cache.as_cache(), &trace);
        assert_eq!(outcome.hits, 3);
        assert_eq!(outcome.misses, 3);
        assert_eq!(outcome.latency.get_tracker.count, 6);
        assert_eq!(outcome.latency.put_tracker.count, 3);
        assert_eq!(cache.evictions(), Some(0));
    }

    #[test]
    fn test_threaded_replay_covers_whole_trace() {
        let trace: Vec<Request> = (0..1_000).map(Request::for_object).collect();
        let cache = SimCache::create(CacheAlgorithm::Sieve, NonZeroUsize::new(100).unwrap());

        let outcome = replay_threaded(cache.as_cache(), &trace, 4).unwrap();
        assert_eq!(outcome.hits + outcome.misses, 1_000);
        // Every key is distinct, so nothing can hit.
        assert_eq!(outcome.misses, 1_000);
        assert_eq!(cache.evictions(), Some(900));
        assert!(cache.verify().is_ok());
    }

    #[test]
    fn test_runner_produces_stats_for_every_combination() {
        let config = small_config(
            vec![CacheAlgorithm::Sieve, CacheAlgorithm::Lru],
            vec![CacheMode::Sequential, CacheMode::Threaded],
        );
        let result = SimulationRunner::new(config).run().unwrap();

        assert_eq!(result.stats.len(), 4);
        assert_eq!(result.total_requests, 5_000);
        for stats in result.stats.values() {
            assert_eq!(stats.hits + stats.misses, 5_000);
            assert!(stats.final_entries <= 50);
        }
        let sieve = &result.stats[&SimulationKey::new(CacheAlgorithm::Sieve, CacheMode::Sequential)];
        assert_eq!(sieve.evictions, Some((sieve.misses - 50) as u64));
    }

    #[test]
    fn test_runner_rejects_zero_capacity() {
        let mut config = small_config(vec![CacheAlgorithm::Sieve], vec![CacheMode::Sequential]);
        config.capacity = 0;
        assert!(SimulationRunner::new(config).run().is_err());
    }

    #[test]
    fn test_latency_merge_keeps_extremes() {
        let mut rng = rand::thread_rng();
        let mut a = OpLatencyTracker::new();
        let mut b = OpLatencyTracker::new();
        a.record(10, &mut rng);
        b.record(5, &mut rng);
        b.record(50, &mut rng);
        a.merge(b);

        let stats = a.finalize_op_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_ns, 65);
        assert_eq!(stats.min_ns, 5);
        assert_eq!(stats.max_ns, 50);
    }
}
