//! Execution time estimation
//!
//! [`estimate_execution_time`] runs an action in growing batches until a
//! target amount of time has been measured, then reports per-call averages.
//! [`Benchmark`] runs a fixed number of timed iterations and keeps every
//! sample for statistics.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lapwatch_config::{BenchConfig, LapwatchConfig, TimerConfig};
use serde::Serialize;

use crate::diagnostics::NullSink;
use crate::registry::TimerRegistry;
use crate::timer::{DISABLED_READING, Timer, is_disabled};

/// Inputs for [`estimate_execution_time`]
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateOptions {
    /// Cumulative measured wall time to reach, in seconds
    pub target: f64,
    /// 0 = silent, 1 = summary, 2 = every batch
    pub verbosity: u8,
    /// Calls in the first batch; 0 is treated as 1
    pub initial_batch: u64,
    /// Clocks reported in the estimate
    pub timer: TimerConfig,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self::from(&BenchConfig::default())
    }
}

impl From<&BenchConfig> for EstimateOptions {
    fn from(config: &BenchConfig) -> Self {
        Self {
            target: config.target_secs,
            verbosity: config.verbosity,
            initial_batch: config.initial_batch,
            timer: TimerConfig::default(),
        }
    }
}

impl From<&LapwatchConfig> for EstimateOptions {
    fn from(config: &LapwatchConfig) -> Self {
        Self {
            timer: config.timer.clone(),
            ..Self::from(&config.bench)
        }
    }
}

impl EstimateOptions {
    pub fn with_target(target: f64) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }
}

/// Result of [`estimate_execution_time`]
///
/// Readings of a disabled clock, totals and averages alike, are
/// [`DISABLED_READING`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionEstimate {
    /// Total calls of the action
    pub executions: u64,
    /// Number of timed batches
    pub batches: u64,
    /// Measured wall seconds over all batches
    pub total_wall: f64,
    /// Measured CPU seconds over all batches
    pub total_cpu: f64,
    /// `total_wall / executions`
    pub average_wall: f64,
    /// `total_cpu / executions`
    pub average_cpu: f64,
}

fn per_call(total: f64, executions: u64) -> f64 {
    if is_disabled(total) {
        DISABLED_READING
    } else {
        total / executions as f64
    }
}

/// Estimate the wall and CPU cost of one call of `action`
///
/// The action runs in batches; each batch is one timer round. Batch sizes
/// grow quickly while far from the target and shrink to the projected
/// remainder near it. At least one batch of at least one call always runs.
///
/// Batching is always driven by wall time, even when `options.timer` turns
/// wall measurement off; only the reported wall readings are disabled then.
/// The internal timer draws its id from a private registry.
pub fn estimate_execution_time<F>(mut action: F, options: &EstimateOptions) -> ExecutionEstimate
where
    F: FnMut(),
{
    let target = if options.target.is_finite() {
        options.target.max(0.0)
    } else {
        BenchConfig::default().target_secs
    };
    let timer = Timer::builder()
        .label("estimate_execution_time")
        .registry(Arc::new(TimerRegistry::new()))
        .config(TimerConfig {
            measure_wall_time: true,
            ..options.timer.clone()
        })
        .build();

    let mut batch = options.initial_batch.max(1);
    let mut executions = 0u64;
    let mut batches = 0u64;

    loop {
        timer.start();
        for _ in 0..batch {
            action();
        }
        timer.stop();

        executions = executions.saturating_add(batch);
        batches += 1;
        let elapsed = timer.total_time();

        if options.verbosity >= 2 {
            tracing::debug!(
                batch,
                executions,
                elapsed,
                round = timer.time(),
                "estimate batch finished"
            );
        }

        if elapsed >= target {
            break;
        }
        batch = next_batch_size(batch, executions, elapsed, target);
    }

    let total_wall = if options.timer.measure_wall_time {
        timer.total_time()
    } else {
        DISABLED_READING
    };
    let total_cpu = timer.total_cpu_time();
    let estimate = ExecutionEstimate {
        executions,
        batches,
        total_wall,
        total_cpu,
        average_wall: per_call(total_wall, executions),
        average_cpu: per_call(total_cpu, executions),
    };

    if options.verbosity >= 1 {
        tracing::info!(
            executions,
            batches,
            average_wall = estimate.average_wall,
            average_cpu = estimate.average_cpu,
            "execution time estimated"
        );
    }

    estimate
}

/// Size of the next batch given what has been measured so far
///
/// Only called while `elapsed < target`.
fn next_batch_size(batch: u64, executions: u64, elapsed: f64, target: f64) -> u64 {
    let progress = elapsed / target;
    let next = if elapsed <= 0.0 || progress < 0.01 {
        batch.saturating_mul(10)
    } else if progress < 0.1 {
        batch.saturating_mul(4)
    } else if progress < 0.5 {
        batch.saturating_mul(2)
    } else {
        let per_call = elapsed / executions as f64;
        ((target - elapsed) / per_call).ceil() as u64
    };
    next.max(1)
}

/// Fixed-iteration benchmark keeping every sample
pub struct Benchmark {
    name: String,
    iterations: usize,
}

impl Benchmark {
    pub fn new(name: impl Into<String>, iterations: usize) -> Self {
        Self {
            name: name.into(),
            iterations,
        }
    }

    /// Run a benchmark with the given function
    ///
    /// Samples come from a timer on a private registry.
    pub fn run<F, T>(&self, mut f: F) -> BenchmarkResult
    where
        F: FnMut() -> T,
    {
        // Warmup
        for _ in 0..std::cmp::min(self.iterations / 10, 10) {
            std::hint::black_box(f());
        }

        let timer = Timer::builder()
            .label(self.name.clone())
            .registry(Arc::new(TimerRegistry::new()))
            .sink(Arc::new(NullSink))
            .build();
        let mut samples = Vec::with_capacity(self.iterations);
        let mut cpu_samples = Vec::with_capacity(self.iterations);

        for _ in 0..self.iterations {
            timer.measure(|| std::hint::black_box(f()));
            samples.push(Duration::from_secs_f64(timer.time()));
            cpu_samples.push(Duration::from_secs_f64(timer.cpu_time()));
        }

        BenchmarkResult {
            name: self.name.clone(),
            iterations: self.iterations,
            samples,
            cpu_samples,
        }
    }
}

/// Result of a benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub name: String,
    pub iterations: usize,
    pub samples: Vec<Duration>,
    pub cpu_samples: Vec<Duration>,
}

impl BenchmarkResult {
    pub fn mean(&self) -> Duration {
        mean_of(&self.samples)
    }

    pub fn mean_cpu(&self) -> Duration {
        mean_of(&self.cpu_samples)
    }

    pub fn median(&self) -> Duration {
        let mut sorted = self.samples.clone();
        sorted.sort();
        sorted.get(sorted.len() / 2).copied().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().min().copied().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or_default()
    }

    pub fn std_dev(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mean = self.mean().as_secs_f64();
        let variance: f64 = self
            .samples
            .iter()
            .map(|sample| {
                let diff = sample.as_secs_f64() - mean;
                diff * diff
            })
            .sum::<f64>()
            / self.samples.len() as f64;
        Duration::from_secs_f64(variance.sqrt())
    }

    /// Items per second at the mean sample time
    pub fn throughput(&self, items: usize) -> f64 {
        let mean = self.mean().as_secs_f64();
        if mean == 0.0 { 0.0 } else { items as f64 / mean }
    }
}

fn mean_of(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }
    let total: f64 = samples.iter().map(Duration::as_secs_f64).sum();
    Duration::from_secs_f64(total / samples.len() as f64)
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Benchmark: {}", self.name)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Mean:       {:?}", self.mean())?;
        writeln!(f, "  Mean CPU:   {:?}", self.mean_cpu())?;
        writeln!(f, "  Median:     {:?}", self.median())?;
        writeln!(f, "  Min:        {:?}", self.min())?;
        writeln!(f, "  Max:        {:?}", self.max())?;
        writeln!(f, "  Std Dev:    {:?}", self.std_dev())?;
        Ok(())
    }
}

/// Percent change of `current`'s mean relative to `baseline`'s
pub fn compare_benchmarks(baseline: &BenchmarkResult, current: &BenchmarkResult) -> f64 {
    let baseline_mean = baseline.mean().as_secs_f64();
    let current_mean = current.mean().as_secs_f64();
    if baseline_mean == 0.0 {
        return 0.0;
    }
    ((current_mean - baseline_mean) / baseline_mean) * 100.0
}
