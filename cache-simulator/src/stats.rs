// Statistics collection and reporting for cache simulation

use crate::models::{
    AlgorithmStats, CacheAlgorithm, CacheMode, CsvResultRow, LatencyStats, SimulationKey,
    SimulationResult, Workload,
};
use std::collections::HashMap;
use std::path::Path;

/// Collects and reports statistics from simulation runs
pub struct SimulationStats {
    /// Stats for each algorithm+mode combination
    stats: HashMap<SimulationKey, AlgorithmStats>,
    /// Algorithms being tested
    algorithms: Vec<CacheAlgorithm>,
}

impl SimulationStats {
    /// Create a new statistics collector for the given algorithms and modes
    pub fn new(algorithms: &[CacheAlgorithm], modes: &[CacheMode]) -> Self {
        let mut stats = HashMap::new();
        for &algo in algorithms {
            for &mode in modes {
                stats.insert(SimulationKey::new(algo, mode), AlgorithmStats::new());
            }
        }

        Self {
            stats,
            algorithms: algorithms.to_vec(),
        }
    }

    /// Record the hits and misses of a finished run
    pub fn record_outcome(&mut self, key: SimulationKey, hits: usize, misses: usize) {
        if let Some(stats) = self.stats.get_mut(&key) {
            stats.hits = hits;
            stats.misses = misses;
        }
    }

    /// Record what the cache reported about itself at the end of a run
    pub fn record_cache_state(
        &mut self,
        key: SimulationKey,
        evictions: Option<u64>,
        final_entries: usize,
    ) {
        if let Some(stats) = self.stats.get_mut(&key) {
            stats.evictions = evictions;
            stats.final_entries = final_entries;
        }
    }

    /// Record simulation time for an algorithm+mode
    pub fn record_time(&mut self, key: SimulationKey, time_ms: u64) {
        if let Some(stats) = self.stats.get_mut(&key) {
            stats.simulation_time_ms = time_ms;
        }
    }

    /// Record latency statistics for an algorithm+mode
    pub fn record_latency(&mut self, key: SimulationKey, latency: LatencyStats) {
        if let Some(stats) = self.stats.get_mut(&key) {
            stats.latency = latency;
        }
    }

    pub fn get(&self, key: &SimulationKey) -> Option<&AlgorithmStats> {
        self.stats.get(key)
    }

    /// Get the current result
    pub fn result(
        &self,
        duration: std::time::Duration,
        unique_objects: usize,
        capacity: usize,
    ) -> SimulationResult {
        SimulationResult {
            stats: self.stats.clone(),
            total_requests: self.total_requests(),
            unique_objects,
            duration,
            capacity,
        }
    }

    // Every run replays the same trace, so any entry gives the total.
    fn total_requests(&self) -> usize {
        self.stats
            .values()
            .next()
            .map(|s| s.hits + s.misses)
            .unwrap_or(0)
    }

    fn sorted_keys(&self) -> Vec<&SimulationKey> {
        let mut keys: Vec<_> = self.stats.keys().collect();
        keys.sort();
        keys
    }

    /// Print a summary report of the simulation results
    pub fn print_summary(&self) {
        println!("\nCache Simulation Summary");
        println!("========================");
        println!("Total requests: {}", self.total_requests());

        println!("\nResults by Algorithm and Mode:");
        println!(
            "{:<6} {:<10} {:>8} {:>10} {:>12} {:>10} {:>10} {:>10} {:>10}",
            "Algo", "Mode", "HitRate", "Evictions", "TotalOps", "Duration", "Ops/sec", "GetAvg",
            "p99"
        );
        println!("{}", "-".repeat(96));

        for key in self.sorted_keys() {
            if let Some(stats) = self.stats.get(key) {
                let evictions = stats
                    .evictions
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "-".to_string());

                println!(
                    "{:<6} {:<10} {:>7.2}% {:>10} {:>12} {:>9.3}s {:>10.0} {:>8.0}ns {:>8}ns",
                    key.algorithm.as_str(),
                    key.mode.as_str(),
                    stats.hit_rate(),
                    evictions,
                    stats.latency.count,
                    stats.latency.duration_secs(),
                    stats.latency.ops_per_sec(),
                    stats.latency.get_stats.avg_ns(),
                    stats.latency.get_stats.p99_ns()
                );
            }
        }
    }

    /// Print a comparison between sequential and threaded modes
    pub fn print_comparison(&self) {
        println!("\n┌─────────────────────────────────────────────────────────────────┐");
        println!("│              Hit-Rate Comparison: Sequential vs Threaded        │");
        println!("├──────────┬────────────┬────────────┬──────────┬─────────────────┤");
        println!("│ Algorithm│ Sequential │  Threaded  │  Delta   │ Notes           │");
        println!("├──────────┼────────────┼────────────┼──────────┼─────────────────┤");

        for algo in &self.algorithms {
            let seq_key = SimulationKey::new(*algo, CacheMode::Sequential);
            let thr_key = SimulationKey::new(*algo, CacheMode::Threaded);

            match (self.stats.get(&seq_key), self.stats.get(&thr_key)) {
                (Some(seq), Some(thr)) => {
                    let delta = thr.hit_rate() - seq.hit_rate();
                    let delta_str = if delta >= 0.0 {
                        format!("+{:.2}%", delta)
                    } else {
                        format!("{:.2}%", delta)
                    };
                    let notes = if delta.abs() < 0.1 {
                        "~equal"
                    } else {
                        "interleaving"
                    };

                    println!(
                        "│ {:<8} │ {:>9.2}% │ {:>9.2}% │ {:>8} │ {:<15} │",
                        algo.as_str(),
                        seq.hit_rate(),
                        thr.hit_rate(),
                        delta_str,
                        notes
                    );
                }
                _ => {
                    println!(
                        "│ {:<8} │ {:>10} │ {:>10} │ {:>8} │ {:<15} │",
                        algo.as_str(),
                        "N/A",
                        "N/A",
                        "N/A",
                        "missing data"
                    );
                }
            }
        }

        println!("└──────────┴────────────┴────────────┴──────────┴─────────────────┘");
        println!("\nNote: threads replay interleaved slices of the trace, so the request");
        println!("order seen by the cache differs slightly from the sequential run.");
    }

    /// Create SimulationStats from a SimulationResult (for CSV export after run)
    pub fn from_result(result: &SimulationResult) -> Self {
        let mut algorithms: Vec<CacheAlgorithm> =
            result.stats.keys().map(|k| k.algorithm).collect();
        algorithms.sort();
        algorithms.dedup();

        Self {
            stats: result.stats.clone(),
            algorithms,
        }
    }

    /// Export results to a CSV file
    pub fn export_csv(
        &self,
        path: &Path,
        workload: Workload,
        capacity: usize,
    ) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in self.csv_rows(workload, capacity) {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn csv_rows(&self, workload: Workload, capacity: usize) -> Vec<CsvResultRow> {
        self.sorted_keys()
            .into_iter()
            .filter_map(|key| self.stats.get(key).map(|stats| (key, stats)))
            .map(|(key, stats)| {
                let get = &stats.latency.get_stats;
                let put = &stats.latency.put_stats;
                CsvResultRow {
                    workload: workload.as_str().to_string(),
                    algorithm: key.algorithm.as_str().to_string(),
                    mode: key.mode.as_str().to_string(),
                    capacity,
                    hits: stats.hits,
                    misses: stats.misses,
                    hit_rate: stats.hit_rate(),
                    evictions: stats.evictions,
                    final_entries: stats.final_entries,
                    simulation_time_ms: stats.simulation_time_ms,
                    total_ops: stats.latency.count,
                    total_duration_ns: stats.latency.total_ns,
                    ops_per_sec: stats.latency.ops_per_sec(),
                    avg_latency_ns: stats.latency.avg_ns(),
                    get_ops: get.count,
                    get_avg_ns: get.avg_ns(),
                    get_min_ns: get.min_ns,
                    get_max_ns: get.max_ns,
                    get_p50_ns: get.p50_ns(),
                    get_p99_ns: get.p99_ns(),
                    put_ops: put.count,
                    put_avg_ns: put.avg_ns(),
                    put_min_ns: put.min_ns,
                    put_max_ns: put.max_ns,
                    put_p50_ns: put.p50_ns(),
                    put_p99_ns: put.p99_ns(),
                }
            })
            .collect()
    }
}
