// Data models for cache simulation

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A single cache request: look the key up, and fill it in on a miss
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Cache key
    pub key: String,
    /// Value stored on a miss
    pub value: u32,
}

impl Request {
    /// Create a request for the object with the given id
    pub fn for_object(id: u32) -> Self {
        Self {
            key: format!("key{id}"),
            value: id,
        }
    }
}

/// Synthetic access patterns the generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Workload {
    /// A fixed share of traffic hits a small share of the key space
    Hotspot,
    /// Key popularity follows a Zipf distribution
    Zipfian,
    /// Zipfian traffic interrupted by sequential scans over cold keys
    ScanMixed,
}

impl Workload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Workload::Hotspot => "hotspot",
            Workload::Zipfian => "zipfian",
            Workload::ScanMixed => "scan-mixed",
        }
    }

    /// Parse a workload name as accepted on the command line
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hotspot" | "hot" => Some(Workload::Hotspot),
            "zipfian" | "zipf" => Some(Workload::Zipfian),
            "scan-mixed" | "scan" => Some(Workload::ScanMixed),
            _ => None,
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache algorithm types supported for simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheAlgorithm {
    Sieve,
    /// `lru` crate behind a mutex
    Lru,
    /// Moka cache (external crate for comparison)
    Moka,
}

impl CacheAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheAlgorithm::Sieve => "SIEVE",
            CacheAlgorithm::Lru => "LRU",
            CacheAlgorithm::Moka => "Moka",
        }
    }

    /// Parse an algorithm name as accepted on the command line
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sieve" => Some(CacheAlgorithm::Sieve),
            "lru" => Some(CacheAlgorithm::Lru),
            "moka" => Some(CacheAlgorithm::Moka),
            _ => None,
        }
    }

    /// Get all available algorithms
    pub fn all() -> Vec<CacheAlgorithm> {
        vec![CacheAlgorithm::Sieve, CacheAlgorithm::Lru, CacheAlgorithm::Moka]
    }
}

/// Cache execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheMode {
    /// One thread replays the whole trace
    Sequential,
    /// The trace is split across worker threads sharing one cache
    Threaded,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Sequential => "Sequential",
            CacheMode::Threaded => "Threaded",
        }
    }

    /// Parse a mode string; `both` expands to every mode
    pub fn parse_list(mode: &str) -> Option<Vec<CacheMode>> {
        match mode.to_lowercase().as_str() {
            "sequential" | "seq" => Some(vec![CacheMode::Sequential]),
            "threaded" | "concurrent" | "conc" => Some(vec![CacheMode::Threaded]),
            "both" | "all" => Some(vec![CacheMode::Sequential, CacheMode::Threaded]),
            _ => None,
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique identifier for a simulation run combining algorithm and mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimulationKey {
    pub algorithm: CacheAlgorithm,
    pub mode: CacheMode,
}

impl SimulationKey {
    pub fn new(algorithm: CacheAlgorithm, mode: CacheMode) -> Self {
        Self { algorithm, mode }
    }
}

impl fmt::Display for SimulationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm.as_str(), self.mode.as_str())
    }
}

/// Parameters of the synthetic trace
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Access pattern
    pub workload: Workload,
    /// Number of requests in the trace
    pub requests: usize,
    /// Number of distinct objects
    pub key_space: u32,
    /// Zipf skew (used by `zipfian` and `scan-mixed`)
    pub zipf_alpha: f64,
    /// Percentage of traffic going to hot objects (used by `hotspot`)
    pub hot_traffic_percent: u8,
    /// Percentage of objects that are hot (used by `hotspot`)
    pub hot_objects_percent: u8,
    /// Seed for reproducible traces
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            workload: Workload::Zipfian,
            requests: 100_000,
            key_space: 10_000,
            zipf_alpha: 0.8,
            hot_traffic_percent: 80,
            hot_objects_percent: 20,
            seed: 42,
        }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Trace parameters
    pub workload: WorkloadConfig,
    /// Cache capacity in number of entries
    pub capacity: usize,
    /// Algorithms to simulate
    pub algorithms: Vec<CacheAlgorithm>,
    /// Modes to simulate
    pub modes: Vec<CacheMode>,
    /// Number of worker threads in threaded mode
    pub thread_count: usize,
}

/// Results of a simulation run
#[derive(Debug)]
pub struct SimulationResult {
    /// Statistics for each algorithm+mode combination
    pub stats: HashMap<SimulationKey, AlgorithmStats>,
    /// Total number of requests processed per run
    pub total_requests: usize,
    /// Number of unique objects in the trace
    pub unique_objects: usize,
    /// Duration of the simulation
    pub duration: Duration,
    /// Cache capacity used
    pub capacity: usize,
}

/// Statistics for a single algorithm
#[derive(Debug, Default, Clone)]
pub struct AlgorithmStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Evictions reported by the cache itself, when it counts them
    pub evictions: Option<u64>,
    /// Entries left in the cache at the end of the run
    pub final_entries: usize,
    /// Wall-clock time of the run in milliseconds
    pub simulation_time_ms: u64,
    /// Latency statistics for cache operations
    pub latency: LatencyStats,
}

/// Latency statistics for a single operation type (get or put)
#[derive(Debug, Clone, Default)]
pub struct OpLatencyStats {
    /// Total time spent (nanoseconds)
    pub total_ns: u64,
    /// Number of operations
    pub count: u64,
    /// Minimum latency (nanoseconds)
    pub min_ns: u64,
    /// Maximum latency (nanoseconds)
    pub max_ns: u64,
    /// Latency percentiles
    pub percentiles: Option<LatencyPercentiles>,
}

impl OpLatencyStats {
    /// Calculate average latency in nanoseconds
    pub fn avg_ns(&self) -> f64 {
        if self.count > 0 {
            self.total_ns as f64 / self.count as f64
        } else {
            0.0
        }
    }

    /// Calculate throughput in operations per second
    pub fn ops_per_sec(&self) -> f64 {
        if self.total_ns > 0 {
            (self.count as f64 * 1_000_000_000.0) / self.total_ns as f64
        } else {
            0.0
        }
    }

    /// Get total duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.total_ns as f64 / 1_000_000_000.0
    }

    pub fn p50_ns(&self) -> u64 {
        self.percentiles.as_ref().map(|p| p.p50_ns).unwrap_or(0)
    }

    pub fn p99_ns(&self) -> u64 {
        self.percentiles.as_ref().map(|p| p.p99_ns).unwrap_or(0)
    }
}

/// Latency statistics for all cache operations
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    /// Total time spent in all cache operations (nanoseconds)
    pub total_ns: u64,
    /// Total number of operations
    pub count: u64,
    /// Get operation stats
    pub get_stats: OpLatencyStats,
    /// Put operation stats
    pub put_stats: OpLatencyStats,
}

/// Latency percentiles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatencyPercentiles {
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
}

impl LatencyStats {
    /// Calculate average latency in nanoseconds (across all operations)
    pub fn avg_ns(&self) -> f64 {
        if self.count > 0 {
            self.total_ns as f64 / self.count as f64
        } else {
            0.0
        }
    }

    /// Calculate throughput in operations per second (all operations)
    pub fn ops_per_sec(&self) -> f64 {
        if self.total_ns > 0 {
            (self.count as f64 * 1_000_000_000.0) / self.total_ns as f64
        } else {
            0.0
        }
    }

    /// Get total duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.total_ns as f64 / 1_000_000_000.0
    }
}

impl AlgorithmStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// CSV export row for simulation results
#[derive(Debug, Serialize)]
pub struct CsvResultRow {
    pub workload: String,
    pub algorithm: String,
    pub mode: String,
    pub capacity: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    pub evictions: Option<u64>,
    pub final_entries: usize,
    pub simulation_time_ms: u64,
    // Combined stats
    /// Total operations (get + put)
    pub total_ops: u64,
    /// Total cache operation time in nanoseconds
    pub total_duration_ns: u64,
    /// Combined ops per second
    pub ops_per_sec: f64,
    /// Combined average latency in nanoseconds
    pub avg_latency_ns: f64,
    // Get operation stats
    pub get_ops: u64,
    pub get_avg_ns: f64,
    pub get_min_ns: u64,
    pub get_max_ns: u64,
    pub get_p50_ns: u64,
    pub get_p99_ns: u64,
    // Put operation stats
    pub put_ops: u64,
    pub put_avg_ns: f64,
    pub put_min_ns: u64,
    pub put_max_ns: u64,
    pub put_p50_ns: u64,
    pub put_p99_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(Workload::parse("Zipf"), Some(Workload::Zipfian));
        assert_eq!(Workload::parse("scan-mixed"), Some(Workload::ScanMixed));
        assert_eq!(Workload::parse("random"), None);

        assert_eq!(CacheAlgorithm::parse("SIEVE"), Some(CacheAlgorithm::Sieve));
        assert_eq!(CacheAlgorithm::parse("lfu"), None);

        assert_eq!(
            CacheMode::parse_list("both"),
            Some(vec![CacheMode::Sequential, CacheMode::Threaded])
        );
        assert_eq!(CacheMode::parse_list("conc"), Some(vec![CacheMode::Threaded]));
        assert_eq!(CacheMode::parse_list("sideways"), None);
    }

    #[test]
    fn test_hit_rate() {
        let stats = AlgorithmStats {
            hits: 3,
            misses: 1,
            ..AlgorithmStats::new()
        };
        assert_eq!(stats.hit_rate(), 75.0);
        assert_eq!(AlgorithmStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_simulation_key_display() {
        let key = SimulationKey::new(CacheAlgorithm::Sieve, CacheMode::Threaded);
        assert_eq!(key.to_string(), "SIEVE-Threaded");
    }
}
