//! Thread-safe stopwatch measuring wall-clock and process CPU time
//!
//! ```no_run
//! use lapwatch_timer::Timer;
//!
//! let timer = Timer::with_label("load");
//! timer.start();
//! // ... work ...
//! timer.stop();
//! println!("{timer}");
//! ```

pub mod bench;
pub mod clock;
pub mod diagnostics;
pub mod profiler;
pub mod registry;
pub mod report;
pub mod timer;

pub use bench::{
    Benchmark, BenchmarkResult, EstimateOptions, ExecutionEstimate, compare_benchmarks,
    estimate_execution_time,
};
pub use diagnostics::{CollectingSink, DiagnosticSink, NullSink, TimerWarning, TracingSink};
pub use profiler::{PhaseProfiler, PhaseTiming};
pub use registry::TimerRegistry;
pub use report::LongReport;
pub use timer::{
    DISABLED_READING, Timer, TimerBuilder, TimerGuard, TimerSnapshot, Transition, is_disabled,
};

pub use lapwatch_config::{CpuClock, TimerConfig};
