use crate::oracle::DEFAULT_PREFIX;

/// Grant size used by the baseline distributed search.
pub const DEFAULT_STEP: u64 = 10_000;
/// Larger grant used by the tuned variant to cut coordination round-trips.
pub const TUNED_STEP: u64 = 40_000;

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub total_solutions: usize,
    pub target_zero_bits: u32,
    pub prefix: String,
}

impl SearchConfig {
    pub fn new(total_solutions: usize, target_zero_bits: u32) -> Self {
        Self {
            total_solutions,
            target_zero_bits,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// How the distributed search spreads work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Size of the fixed worker pool.
    pub workers: usize,
    /// Threads each worker scans a grant with.
    pub compute_lanes: usize,
    /// Range length each worker requests per grant.
    pub step: u64,
    /// Give co-located workers one lane fewer so the coordinator keeps a core.
    pub reserve_coordinator_lane: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            compute_lanes: 1,
            step: DEFAULT_STEP,
            reserve_coordinator_lane: false,
        }
    }
}

impl ParallelConfig {
    /// Preset for the tuned variant: larger step and lane correction enabled.
    pub fn tuned() -> Self {
        Self {
            step: TUNED_STEP,
            reserve_coordinator_lane: true,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_compute_lanes(mut self, compute_lanes: usize) -> Self {
        self.compute_lanes = compute_lanes.max(1);
        self
    }

    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step.max(1);
        self
    }

    pub fn with_coordinator_lane_reserved(mut self, reserve: bool) -> Self {
        self.reserve_coordinator_lane = reserve;
        self
    }

    /// Lanes a worker actually runs with after the co-location correction.
    pub fn lanes_per_worker(&self) -> usize {
        lanes_for_worker(self.compute_lanes, self.reserve_coordinator_lane)
    }
}

pub fn lanes_for_worker(requested: usize, reserve_coordinator_lane: bool) -> usize {
    let lanes = if reserve_coordinator_lane {
        requested.saturating_sub(1)
    } else {
        requested
    };
    lanes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParallelConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.step, DEFAULT_STEP);
        assert!(!config.reserve_coordinator_lane);
    }

    #[test]
    fn test_tuned_preset() {
        let config = ParallelConfig::tuned().with_compute_lanes(8);
        assert_eq!(config.step, TUNED_STEP);
        assert_eq!(config.lanes_per_worker(), 7);
    }

    #[test]
    fn test_builder_minimums() {
        let config = ParallelConfig::default()
            .with_workers(0)
            .with_compute_lanes(0)
            .with_step(0);
        assert_eq!(config.workers, 1);
        assert_eq!(config.compute_lanes, 1);
        assert_eq!(config.step, 1);
    }

    #[test]
    fn test_lane_correction_never_below_one() {
        assert_eq!(lanes_for_worker(1, true), 1);
        assert_eq!(lanes_for_worker(2, true), 1);
        assert_eq!(lanes_for_worker(4, false), 4);
    }

    #[test]
    fn test_search_config_prefix() {
        let config = SearchConfig::new(3, 8);
        assert_eq!(config.prefix, "desafio");
        assert_eq!(config.with_prefix("alt").prefix, "alt");
    }
}
