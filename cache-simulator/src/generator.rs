//! Synthetic request traces
//!
//! Every trace is produced from a seeded `StdRng`, so the same
//! [`WorkloadConfig`] always yields the same requests and different algorithms
//! can be compared on identical input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::models::{Request, Workload, WorkloadConfig};

/// Length of each sequential scan in the `scan-mixed` workload
const SCAN_LENGTH: usize = 500;
/// A scan starts once every this many requests
const SCAN_PERIOD: usize = 5_000;

/// Samples ranks `0..n` with probability proportional to `1 / (rank + 1)^alpha`.
///
/// The cumulative distribution is computed once, so each sample is a binary
/// search rather than a walk over the whole key space.
#[derive(Debug, Clone)]
pub struct ZipfSampler {
    cdf: Vec<f64>,
}

impl ZipfSampler {
    pub fn new(n: u32, alpha: f64) -> Self {
        let mut cdf = Vec::with_capacity(n as usize);
        let mut sum = 0.0;
        for rank in 1..=n {
            sum += 1.0 / (rank as f64).powf(alpha);
            cdf.push(sum);
        }
        Self { cdf }
    }

    /// Draws one rank; rank 0 is the most popular.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let total = self.cdf.last().copied().unwrap_or(0.0);
        let target = rng.gen::<f64>() * total;
        let rank = self.cdf.partition_point(|&c| c < target);
        rank.min(self.cdf.len().saturating_sub(1)) as u32
    }
}

/// Generator for synthetic request traces
#[derive(Debug)]
pub struct WorkloadGenerator {
    config: WorkloadConfig,
}

impl WorkloadGenerator {
    /// Create a new generator, rejecting parameters that cannot produce a trace
    pub fn new(config: WorkloadConfig) -> Result<Self, String> {
        if config.key_space == 0 {
            return Err("key space must contain at least one object".to_string());
        }
        if config.hot_traffic_percent > 100 || config.hot_objects_percent > 100 {
            return Err("hotspot percentages must be between 0 and 100".to_string());
        }
        if !(config.zipf_alpha.is_finite() && config.zipf_alpha >= 0.0) {
            return Err(format!("invalid zipf alpha {}", config.zipf_alpha));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Generate the full trace
    pub fn generate(&self) -> Vec<Request> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        debug!(
            workload = %self.config.workload,
            requests = self.config.requests,
            key_space = self.config.key_space,
            "generating trace"
        );

        match self.config.workload {
            Workload::Hotspot => self.hotspot(&mut rng),
            Workload::Zipfian => self.zipfian(&mut rng),
            Workload::ScanMixed => self.scan_mixed(&mut rng),
        }
    }

    fn hotspot(&self, rng: &mut StdRng) -> Vec<Request> {
        let key_space = self.config.key_space;
        let hot_objects =
            ((key_space as u64 * self.config.hot_objects_percent as u64) / 100).max(1) as u32;

        (0..self.config.requests)
            .map(|_| {
                let hot = rng.gen_range(0..100u8) < self.config.hot_traffic_percent;
                let id = if hot || hot_objects >= key_space {
                    rng.gen_range(0..hot_objects.min(key_space))
                } else {
                    rng.gen_range(hot_objects..key_space)
                };
                Request::for_object(id)
            })
            .collect()
    }

    fn zipfian(&self, rng: &mut StdRng) -> Vec<Request> {
        let sampler = ZipfSampler::new(self.config.key_space, self.config.zipf_alpha);
        (0..self.config.requests)
            .map(|_| Request::for_object(sampler.sample(rng)))
            .collect()
    }

    // Scanned objects live above the key space and are never requested again.
    fn scan_mixed(&self, rng: &mut StdRng) -> Vec<Request> {
        let sampler = ZipfSampler::new(self.config.key_space, self.config.zipf_alpha);
        let mut scan_cursor = self.config.key_space;

        (0..self.config.requests)
            .map(|i| {
                if i % SCAN_PERIOD < SCAN_LENGTH {
                    let id = scan_cursor;
                    scan_cursor = scan_cursor.wrapping_add(1).max(self.config.key_space);
                    Request::for_object(id)
                } else {
                    Request::for_object(sampler.sample(rng))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(workload: Workload) -> WorkloadConfig {
        WorkloadConfig {
            workload,
            requests: 20_000,
            key_space: 1_000,
            ..WorkloadConfig::default()
        }
    }

    fn counts(trace: &[Request]) -> HashMap<u32, usize> {
        let mut counts = HashMap::new();
        for request in trace {
            *counts.entry(request.value).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_rejects_empty_key_space() {
        let cfg = WorkloadConfig {
            key_space: 0,
            ..WorkloadConfig::default()
        };
        assert!(WorkloadGenerator::new(cfg).is_err());
    }

    #[test]
    fn test_same_seed_same_trace() {
        let a = WorkloadGenerator::new(config(Workload::Zipfian)).unwrap().generate();
        let b = WorkloadGenerator::new(config(Workload::Zipfian)).unwrap().generate();
        assert_eq!(a, b);

        let other = WorkloadConfig {
            seed: 7,
            ..config(Workload::Zipfian)
        };
        let c = WorkloadGenerator::new(other).unwrap().generate();
        assert_ne!(a, c);
    }

    #[test]
    fn test_zipf_sampler_favors_low_ranks() {
        let sampler = ZipfSampler::new(100, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut first = 0;
        let mut last = 0;
        for _ in 0..10_000 {
            match sampler.sample(&mut rng) {
                0 => first += 1,
                99 => last += 1,
                r => assert!(r < 100),
            }
        }
        assert!(first > last * 10);
    }

    #[test]
    fn test_hotspot_concentrates_traffic() {
        let trace = WorkloadGenerator::new(config(Workload::Hotspot)).unwrap().generate();
        assert_eq!(trace.len(), 20_000);

        // Hot objects are ids 0..200 and should draw roughly 80% of requests.
        let hot = trace.iter().filter(|r| r.value < 200).count();
        let share = hot as f64 / trace.len() as f64;
        assert!((0.75..0.85).contains(&share), "hot share was {share}");
        assert!(trace.iter().all(|r| r.value < 1_000));
    }

    #[test]
    fn test_scan_mixed_contains_one_shot_scans() {
        let trace = WorkloadGenerator::new(config(Workload::ScanMixed)).unwrap().generate();
        let scanned: Vec<_> = trace.iter().filter(|r| r.value >= 1_000).collect();
        assert_eq!(scanned.len(), (20_000 / SCAN_PERIOD) * SCAN_LENGTH);

        let counts = counts(&trace);
        assert!(scanned.iter().all(|r| counts[&r.value] == 1));
        assert_eq!(trace[0].key, "key1000");
        assert_eq!(trace[1].key, "key1001");
    }
}
