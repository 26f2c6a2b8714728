use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::diagnostics::NullSink;
use crate::registry::TimerRegistry;
use crate::timer::Timer;

/// Records named wall and CPU timings for sequential phases.
#[derive(Debug, Default)]
pub struct PhaseProfiler {
    phases: Vec<PhaseTiming>,
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` and record its timing under `name`
    ///
    /// Each phase gets its own timer on a private registry.
    pub fn record_phase<F, T>(&mut self, name: impl Into<String>, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let name = name.into();
        let timer = Timer::builder()
            .label(name.clone())
            .registry(Arc::new(TimerRegistry::new()))
            .sink(Arc::new(NullSink))
            .build();
        let output = timer.measure(f);
        self.phases.push(PhaseTiming {
            name,
            wall: timer.time(),
            cpu: timer.cpu_time(),
        });
        output
    }

    pub fn push_phase(&mut self, name: impl Into<String>, wall: f64, cpu: f64) {
        self.phases.push(PhaseTiming {
            name: name.into(),
            wall,
            cpu,
        });
    }

    pub fn phases(&self) -> &[PhaseTiming] {
        &self.phases
    }

    pub fn total_wall(&self) -> f64 {
        self.phases.iter().map(|phase| phase.wall).sum()
    }

    pub fn total_cpu(&self) -> f64 {
        self.phases.iter().map(|phase| phase.cpu).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseTiming {
    pub name: String,
    /// Seconds
    pub wall: f64,
    /// Seconds
    pub cpu: f64,
}

impl fmt::Display for PhaseProfiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .phases
            .iter()
            .map(|phase| phase.name.len())
            .max()
            .unwrap_or(0)
            .max("total".len());
        let total = self.total_wall();

        for phase in &self.phases {
            let share = if total > 0.0 {
                phase.wall / total * 100.0
            } else {
                0.0
            };
            writeln!(
                f,
                "{:<width$}  {:>10.6} s  {:>10.6} s cpu  {:>5.1}%",
                phase.name, phase.wall, phase.cpu, share
            )?;
        }
        writeln!(
            f,
            "{:<width$}  {:>10.6} s  {:>10.6} s cpu",
            "total",
            total,
            self.total_cpu()
        )
    }
}
