//! Misuse reporting
//!
//! Timer operations never fail. Double starts, stops without a start, and the
//! process-wide CPU clock substitution are reported through a
//! [`DiagnosticSink`] chosen when the timer is built.

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerWarning {
    #[error("timer {id}: start ignored, already running")]
    AlreadyRunning { id: u64 },

    #[error("timer {id}: stop ignored, not running")]
    NotRunning { id: u64 },

    #[error("timer {id}: per-thread CPU time unavailable, measuring process CPU time")]
    ProcessCpuTime { id: u64 },
}

impl TimerWarning {
    pub const fn timer_id(&self) -> u64 {
        match self {
            Self::AlreadyRunning { id } | Self::NotRunning { id } | Self::ProcessCpuTime { id } => {
                *id
            }
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, warning: &TimerWarning);
}

/// Forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, warning: &TimerWarning) {
        tracing::warn!(timer_id = warning.timer_id(), "{warning}");
    }
}

/// Drops every warning
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn warn(&self, _warning: &TimerWarning) {}
}

/// Keeps warnings in memory for later inspection
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: Mutex<Vec<TimerWarning>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<TimerWarning> {
        self.warnings.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().is_empty()
    }

    /// Remove and return everything collected so far
    pub fn drain(&self) -> Vec<TimerWarning> {
        std::mem::take(&mut *self.warnings.lock())
    }
}

impl DiagnosticSink for CollectingSink {
    fn warn(&self, warning: &TimerWarning) {
        self.warnings.lock().push(warning.clone());
    }
}
