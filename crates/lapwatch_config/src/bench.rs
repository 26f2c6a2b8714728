//! Batch estimator configuration

use serde::{Deserialize, Serialize};

/// Defaults for `estimate_execution_time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Cumulative measured time to reach, in seconds
    pub target_secs: f64,

    /// Calls in the first batch
    pub initial_batch: u64,

    /// 0 = silent, 1 = summary, 2 = every batch
    pub verbosity: u8,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            target_secs: 0.1,
            initial_batch: 1,
            verbosity: 0,
        }
    }
}

impl BenchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env();
        config
    }

    /// Overwrite fields whose environment variable is set and valid
    pub fn merge_env(&mut self) {
        if let Ok(value) = std::env::var("LAPWATCH_BENCH_TARGET")
            && let Ok(secs) = value.parse::<f64>()
            && secs.is_finite()
        {
            self.target_secs = secs.max(0.0);
        }

        if let Ok(value) = std::env::var("LAPWATCH_BENCH_BATCH")
            && let Ok(batch) = value.parse::<u64>()
        {
            self.initial_batch = batch.max(1);
        }

        if let Ok(value) = std::env::var("LAPWATCH_BENCH_VERBOSITY")
            && let Ok(level) = value.parse::<u8>()
        {
            self.verbosity = level;
        }
    }
}
