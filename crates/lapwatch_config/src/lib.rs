//! Configuration for timers and the benchmark helpers
//!
//! Every section can be built from defaults, from `LAPWATCH_*` environment
//! variables, or (with the `toml-config` feature) from a TOML file.

pub mod bench;
pub mod error;
pub mod timer;

pub use crate::bench::BenchConfig;
pub use crate::error::ConfigError;
pub use crate::timer::{CpuClock, TimerConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapwatchConfig {
    /// Timer defaults
    pub timer: TimerConfig,

    /// Batch estimator defaults
    pub bench: BenchConfig,
}

impl LapwatchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            timer: TimerConfig::from_env(),
            bench: BenchConfig::from_env(),
        }
    }

    /// Load configuration from TOML file
    #[cfg(feature = "toml-config")]
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from TOML file (stub when toml feature is disabled)
    #[cfg(not(feature = "toml-config"))]
    pub fn from_file(_path: &Path) -> anyhow::Result<Self> {
        anyhow::bail!("TOML support not enabled. Enable the 'toml-config' feature.")
    }

    /// Save configuration to TOML file
    #[cfg(feature = "toml-config")]
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Save configuration to TOML file (stub when toml feature is disabled)
    #[cfg(not(feature = "toml-config"))]
    pub fn save_to_file(&self, _path: &Path) -> anyhow::Result<()> {
        anyhow::bail!("TOML support not enabled. Enable the 'toml-config' feature.")
    }

    /// Merge with environment variables (env vars take precedence)
    pub fn merge_with_env(mut self) -> Self {
        self.timer.merge_env();
        self.bench.merge_env();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LapwatchConfig::default();
        assert!(config.timer.measure_wall_time);
        assert!(config.timer.measure_cpu_time);
        assert_eq!(config.timer.cpu_clock, CpuClock::Process);
        assert!((config.bench.target_secs - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.bench.initial_batch, 1);
    }

    #[cfg(not(feature = "toml-config"))]
    #[test]
    fn test_from_file_requires_feature() {
        let err = LapwatchConfig::from_file(Path::new("lapwatch.toml")).unwrap_err();
        assert!(err.to_string().contains("toml-config"));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lapwatch.toml");

        let mut config = LapwatchConfig::default();
        config.timer.measure_cpu_time = false;
        config.timer.cpu_clock = CpuClock::Thread;
        config.bench.target_secs = 0.25;
        config.save_to_file(&path).unwrap();

        let loaded = LapwatchConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[bench]\ninitial_batch = 8\n").unwrap();

        let loaded = LapwatchConfig::from_file(&path).unwrap();
        assert_eq!(loaded.bench.initial_batch, 8);
        assert_eq!(loaded.timer, TimerConfig::default());
    }
}
