//! Round-based stopwatch measuring wall-clock and process CPU time
//!
//! A [`Timer`] accumulates time over any number of start/stop rounds. Every
//! accessor and mutator takes the instance's own lock, so one timer can be
//! shared freely between threads while unrelated timers never contend.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use lapwatch_config::{CpuClock, TimerConfig};

use crate::clock::{self, Sample};
use crate::diagnostics::{DiagnosticSink, TimerWarning, TracingSink};
use crate::registry::{RegistryHandle, TimerRegistry};

/// Reading reported by a disabled clock
pub const DISABLED_READING: f64 = -1e-9;

/// Whether `reading` is [`DISABLED_READING`] rather than a measurement
#[allow(clippy::float_cmp)]
pub fn is_disabled(reading: f64) -> bool {
    reading == DISABLED_READING
}

/// Outcome of [`Timer::start`] and [`Timer::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed
    Applied,
    /// Call was a no-op and a warning was emitted
    Ignored,
}

impl Transition {
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug)]
struct TimerState {
    label: Option<String>,
    running: bool,
    used: bool,
    created_at: DateTime<Local>,
    total_wall: f64,
    total_cpu: f64,
    round_start: Option<Sample>,
    round_stop: Option<Sample>,
    round_started_at: Option<DateTime<Local>>,
    round_stopped_at: Option<DateTime<Local>>,
    first_start: Option<Sample>,
    first_started_at: Option<DateTime<Local>>,
    measure_wall: bool,
    measure_cpu: bool,
}

impl TimerState {
    fn new(label: Option<String>, config: &TimerConfig) -> Self {
        Self {
            label,
            running: false,
            used: false,
            created_at: Local::now(),
            total_wall: 0.0,
            total_cpu: 0.0,
            round_start: None,
            round_stop: None,
            round_started_at: None,
            round_stopped_at: None,
            first_start: None,
            first_started_at: None,
            measure_wall: config.measure_wall_time,
            measure_cpu: config.measure_cpu_time,
        }
    }

    /// Wall seconds of the open round up to `now`, or of the last closed one
    fn round_wall(&self, now: Instant) -> f64 {
        if !self.measure_wall {
            return DISABLED_READING;
        }
        if !self.used {
            return 0.0;
        }
        match (self.running, self.round_start, self.round_stop) {
            (true, Some(start), _) => wall_delta(start.wall, now),
            (false, Some(start), Some(stop)) => wall_delta(start.wall, stop.wall),
            _ => 0.0,
        }
    }

    fn round_cpu(&self, now: f64) -> f64 {
        if !self.measure_cpu {
            return DISABLED_READING;
        }
        if !self.used {
            return 0.0;
        }
        match (self.running, self.round_start, self.round_stop) {
            (true, Some(start), _) => cpu_delta(start.cpu, now),
            (false, Some(start), Some(stop)) => cpu_delta(start.cpu, stop.cpu),
            _ => 0.0,
        }
    }

    fn total_wall(&self, now: Instant) -> f64 {
        if !self.measure_wall {
            return DISABLED_READING;
        }
        match (self.running, self.round_start) {
            (true, Some(start)) => self.total_wall + wall_delta(start.wall, now),
            _ => self.total_wall,
        }
    }

    fn total_cpu(&self, now: f64) -> f64 {
        if !self.measure_cpu {
            return DISABLED_READING;
        }
        match (self.running, self.round_start) {
            (true, Some(start)) => self.total_cpu + cpu_delta(start.cpu, now),
            _ => self.total_cpu,
        }
    }

    /// Wall seconds from the first start to now (running) or the last stop
    fn span_wall(&self, now: Instant) -> f64 {
        if !self.measure_wall {
            return DISABLED_READING;
        }
        match (self.used, self.running, self.first_start, self.round_stop) {
            (true, true, Some(first), _) => wall_delta(first.wall, now),
            (true, false, Some(first), Some(stop)) => wall_delta(first.wall, stop.wall),
            _ => 0.0,
        }
    }

    fn span_cpu(&self, now: f64) -> f64 {
        if !self.measure_cpu {
            return DISABLED_READING;
        }
        match (self.used, self.running, self.first_start, self.round_stop) {
            (true, true, Some(first), _) => cpu_delta(first.cpu, now),
            (true, false, Some(first), Some(stop)) => cpu_delta(first.cpu, stop.cpu),
            _ => 0.0,
        }
    }
}

fn wall_delta(from: Instant, to: Instant) -> f64 {
    to.saturating_duration_since(from).as_secs_f64()
}

fn cpu_delta(from: f64, to: f64) -> f64 {
    (to - from).max(0.0)
}

/// Thread-safe stopwatch
pub struct Timer {
    id: u64,
    cpu_clock: CpuClock,
    max_cpu_warnings: u32,
    registry: RegistryHandle,
    sink: Arc<dyn DiagnosticSink>,
    state: Mutex<TimerState>,
}

impl Timer {
    /// Unlabelled timer on the global registry
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self::builder().label(label).build()
    }

    pub fn builder() -> TimerBuilder {
        TimerBuilder::default()
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> Option<String> {
        self.state.lock().label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.state.lock().label = Some(label.into());
    }

    pub fn clear_label(&self) {
        self.state.lock().label = None;
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Started at least once since creation or the last reset
    pub fn is_used(&self) -> bool {
        self.state.lock().used
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.state.lock().created_at
    }

    pub fn first_started_at(&self) -> Option<DateTime<Local>> {
        let state = self.state.lock();
        if state.used { state.first_started_at } else { None }
    }

    pub fn measures_wall_time(&self) -> bool {
        self.state.lock().measure_wall
    }

    pub fn measures_cpu_time(&self) -> bool {
        self.state.lock().measure_cpu
    }

    pub fn set_measure_wall_time(&self, enabled: bool) {
        self.state.lock().measure_wall = enabled;
    }

    pub fn set_measure_cpu_time(&self, enabled: bool) {
        self.state.lock().measure_cpu = enabled;
    }

    /// Open a round
    ///
    /// Starting a running timer leaves the open round untouched and emits
    /// [`TimerWarning::AlreadyRunning`].
    pub fn start(&self) -> Transition {
        let mut state = self.state.lock();
        if state.running {
            drop(state);
            self.sink.warn(&TimerWarning::AlreadyRunning { id: self.id });
            return Transition::Ignored;
        }

        let sample = Sample::now();
        let stamp = Local::now();
        state.round_start = Some(sample);
        state.round_started_at = Some(stamp);
        if !state.used {
            state.used = true;
            state.first_start = Some(sample);
            state.first_started_at = Some(stamp);
        }
        state.running = true;
        let measure_cpu = state.measure_cpu;
        drop(state);

        if measure_cpu
            && self.cpu_clock == CpuClock::Thread
            && self.registry.try_claim_cpu_warning(self.max_cpu_warnings)
        {
            self.sink.warn(&TimerWarning::ProcessCpuTime { id: self.id });
        }
        Transition::Applied
    }

    /// Close the open round and add it to the totals
    ///
    /// Stopping a stopped timer changes nothing and emits
    /// [`TimerWarning::NotRunning`].
    pub fn stop(&self) -> Transition {
        let mut state = self.state.lock();
        let open_round = if state.running { state.round_start } else { None };
        let Some(start) = open_round else {
            drop(state);
            self.sink.warn(&TimerWarning::NotRunning { id: self.id });
            return Transition::Ignored;
        };

        let sample = Sample::now();
        state.round_stop = Some(sample);
        state.round_stopped_at = Some(Local::now());
        state.total_wall += wall_delta(start.wall, sample.wall);
        state.total_cpu += cpu_delta(start.cpu, sample.cpu);
        state.running = false;
        Transition::Applied
    }

    /// Back to the post-creation state, keeping id, label and clock flags
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.running = false;
        state.used = false;
        state.total_wall = 0.0;
        state.total_cpu = 0.0;
        state.created_at = Local::now();
    }

    /// Wall seconds of the current round, or of the last one when stopped
    pub fn time(&self) -> f64 {
        self.state.lock().round_wall(clock::wall_now())
    }

    /// CPU seconds of the current round, or of the last one when stopped
    pub fn cpu_time(&self) -> f64 {
        self.state.lock().round_cpu(clock::process_cpu_time())
    }

    /// Wall seconds over every round since creation or reset
    pub fn total_time(&self) -> f64 {
        self.state.lock().total_wall(clock::wall_now())
    }

    /// CPU seconds over every round since creation or reset
    pub fn total_cpu_time(&self) -> f64 {
        self.state.lock().total_cpu(clock::process_cpu_time())
    }

    /// Wall seconds from the first start, pauses included
    pub fn span_time(&self) -> f64 {
        self.state.lock().span_wall(clock::wall_now())
    }

    /// CPU seconds from the first start, pauses included
    pub fn span_cpu_time(&self) -> f64 {
        self.state.lock().span_cpu(clock::process_cpu_time())
    }

    /// All readings taken under a single lock acquisition
    pub fn snapshot(&self) -> TimerSnapshot {
        let state = self.state.lock();
        let now = Sample::now();
        TimerSnapshot {
            id: self.id,
            label: state.label.clone(),
            running: state.running,
            used: state.used,
            created_at: state.created_at,
            first_started_at: state.first_started_at.filter(|_| state.used),
            round_started_at: state.round_started_at.filter(|_| state.used),
            round_stopped_at: state
                .round_stopped_at
                .filter(|_| state.used && !state.running),
            time: state.round_wall(now.wall),
            cpu_time: state.round_cpu(now.cpu),
            total_time: state.total_wall(now.wall),
            total_cpu_time: state.total_cpu(now.cpu),
            span_time: state.span_wall(now.wall),
            span_cpu_time: state.span_cpu(now.cpu),
            measure_wall_time: state.measure_wall,
            measure_cpu_time: state.measure_cpu,
        }
    }

    /// Start now and stop when the guard drops
    ///
    /// If the timer was already running the guard leaves it alone on drop.
    pub fn scope(&self) -> TimerGuard<'_> {
        let started = self.start().is_applied();
        TimerGuard {
            timer: self,
            started,
        }
    }

    /// Run `f` inside one round
    pub fn measure<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _guard = self.scope();
        f()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("label", &state.label)
            .field("running", &state.running)
            .field("used", &state.used)
            .field("total_wall", &state.total_wall)
            .field("total_cpu", &state.total_cpu)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Timer`]
#[derive(Default)]
pub struct TimerBuilder {
    label: Option<String>,
    config: TimerConfig,
    registry: RegistryHandle,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl TimerBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn config(mut self, config: TimerConfig) -> Self {
        self.config = config;
        self
    }

    /// Allocate the id from `registry` instead of the global one
    pub fn registry(mut self, registry: Arc<TimerRegistry>) -> Self {
        self.registry = RegistryHandle::Scoped(registry);
        self
    }

    /// Where warnings go; defaults to [`TracingSink`]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Timer {
        let id = self.registry.allocate_id();
        Timer {
            id,
            cpu_clock: self.config.cpu_clock,
            max_cpu_warnings: self.config.max_cpu_warnings,
            registry: self.registry,
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            state: Mutex::new(TimerState::new(self.label, &self.config)),
        }
    }
}

/// Stops its timer on drop; see [`Timer::scope`]
#[must_use = "the round ends as soon as the guard is dropped"]
pub struct TimerGuard<'a> {
    timer: &'a Timer,
    started: bool,
}

impl TimerGuard<'_> {
    pub fn timer(&self) -> &Timer {
        self.timer
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        if self.started {
            self.timer.stop();
        }
    }
}

/// Point-in-time view of a timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub id: u64,
    pub label: Option<String>,
    pub running: bool,
    pub used: bool,
    pub created_at: DateTime<Local>,
    pub first_started_at: Option<DateTime<Local>>,
    pub round_started_at: Option<DateTime<Local>>,
    pub round_stopped_at: Option<DateTime<Local>>,
    pub time: f64,
    pub cpu_time: f64,
    pub total_time: f64,
    pub total_cpu_time: f64,
    pub span_time: f64,
    pub span_cpu_time: f64,
    pub measure_wall_time: bool,
    pub measure_cpu_time: bool,
}
