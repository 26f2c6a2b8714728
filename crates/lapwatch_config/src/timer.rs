//! Timer configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which CPU clock a timer asks for
///
/// Only process-wide CPU time is sampled. Asking for `Thread` keeps the
/// process-wide reading and reports the substitution as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CpuClock {
    /// Processor time consumed by the whole process
    #[default]
    Process,
    /// Processor time consumed by the calling thread
    Thread,
}

impl std::str::FromStr for CpuClock {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "process" | "proc" => Ok(Self::Process),
            "thread" => Ok(Self::Thread),
            _ => Err(ConfigError::UnknownCpuClock(s.to_string())),
        }
    }
}

impl std::fmt::Display for CpuClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Process => write!(f, "process"),
            Self::Thread => write!(f, "thread"),
        }
    }
}

/// Defaults applied to newly created timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Measure wall-clock time
    pub measure_wall_time: bool,

    /// Measure CPU time
    pub measure_cpu_time: bool,

    /// Requested CPU clock
    pub cpu_clock: CpuClock,

    /// How many times a registry reports the process-wide CPU substitution
    pub max_cpu_warnings: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            measure_wall_time: true,
            measure_cpu_time: true,
            cpu_clock: CpuClock::Process,
            max_cpu_warnings: 1,
        }
    }
}

impl TimerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env();
        config
    }

    /// Overwrite fields whose environment variable is set and valid
    pub fn merge_env(&mut self) {
        if let Ok(value) = std::env::var("LAPWATCH_MEASURE_WALL")
            && let Ok(flag) = parse_flag(&value)
        {
            self.measure_wall_time = flag;
        }

        if let Ok(value) = std::env::var("LAPWATCH_MEASURE_CPU")
            && let Ok(flag) = parse_flag(&value)
        {
            self.measure_cpu_time = flag;
        }

        if let Ok(value) = std::env::var("LAPWATCH_CPU_CLOCK")
            && let Ok(clock) = value.parse()
        {
            self.cpu_clock = clock;
        }

        if let Ok(value) = std::env::var("LAPWATCH_MAX_CPU_WARNINGS")
            && let Ok(max) = value.parse::<u32>()
        {
            self.max_cpu_warnings = max;
        }
    }
}

pub(crate) fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(value.to_string())),
    }
}
