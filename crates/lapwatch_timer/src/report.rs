//! Human-readable timer summaries

use std::fmt;

use chrono::{DateTime, Local};

use crate::timer::{Timer, TimerSnapshot, is_disabled};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

struct Seconds(f64);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_disabled(self.0) {
            write!(f, "disabled")
        } else {
            write!(f, "{:.6} s", self.0)
        }
    }
}

struct Stamp(Option<DateTime<Local>>);

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(at) => write!(f, "{}", at.format(TIMESTAMP_FORMAT)),
            None => write!(f, "-"),
        }
    }
}

fn write_title(f: &mut fmt::Formatter<'_>, snapshot: &TimerSnapshot) -> fmt::Result {
    match &snapshot.label {
        Some(label) => writeln!(f, "Timer {} ({label})", snapshot.id),
        None => writeln!(f, "Timer {}", snapshot.id),
    }
}

fn write_summary(f: &mut fmt::Formatter<'_>, snapshot: &TimerSnapshot) -> fmt::Result {
    write_title(f, snapshot)?;
    if !snapshot.used {
        return writeln!(f, "  Not started yet");
    }

    if snapshot.running {
        writeln!(f, "  Running; total so far:  {}", Seconds(snapshot.total_time))?;
        writeln!(f, "  Total CPU so far:       {}", Seconds(snapshot.total_cpu_time))?;
        writeln!(f, "  Current round:          {}", Seconds(snapshot.time))?;
        writeln!(f, "  Current round CPU:      {}", Seconds(snapshot.cpu_time))
    } else {
        writeln!(f, "  Stopped; total:         {}", Seconds(snapshot.total_time))?;
        writeln!(f, "  Total CPU:              {}", Seconds(snapshot.total_cpu_time))?;
        writeln!(f, "  Last round:             {}", Seconds(snapshot.time))?;
        writeln!(f, "  Last round CPU:         {}", Seconds(snapshot.cpu_time))
    }
}

impl fmt::Display for TimerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, self)
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, &self.snapshot())
    }
}

/// Extended summary with absolute timestamps and state flags
pub struct LongReport {
    snapshot: TimerSnapshot,
}

impl LongReport {
    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }
}

impl fmt::Display for LongReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        write_summary(f, s)?;
        writeln!(f, "  Created:                {}", Stamp(Some(s.created_at)))?;
        writeln!(f, "  First start:            {}", Stamp(s.first_started_at))?;
        writeln!(f, "  Round start:            {}", Stamp(s.round_started_at))?;
        writeln!(f, "  Round stop:             {}", Stamp(s.round_stopped_at))?;
        writeln!(f, "  Span since first start: {}", Seconds(s.span_time))?;
        writeln!(f, "  Span CPU:               {}", Seconds(s.span_cpu_time))?;
        writeln!(f, "  Used: {}, running: {}", s.used, s.running)
    }
}

impl Timer {
    pub fn long_report(&self) -> LongReport {
        LongReport {
            snapshot: self.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::registry::TimerRegistry;
    use std::sync::Arc;

    fn timer() -> Timer {
        Timer::builder()
            .label("report")
            .registry(Arc::new(TimerRegistry::new()))
            .sink(Arc::new(NullSink))
            .build()
    }

    #[test]
    fn test_report_wording_follows_state() {
        let timer = timer();
        let fresh = timer.to_string();
        assert!(fresh.starts_with("Timer 1 (report)"));
        assert!(fresh.contains("Not started yet"));

        timer.start();
        let running = timer.to_string();
        assert!(running.contains("Running; total so far"));
        assert!(running.contains("Current round"));

        timer.stop();
        let stopped = timer.to_string();
        assert!(stopped.contains("Stopped; total"));
        assert!(stopped.contains("Last round CPU"));
    }

    #[test]
    fn test_disabled_clock_rendering() {
        let timer = timer();
        timer.set_measure_cpu_time(false);
        timer.start();
        timer.stop();
        let text = timer.to_string();
        assert!(text.contains("Total CPU:              disabled"));
        assert!(
            !text
                .lines()
                .any(|line| line.contains("Stopped; total") && line.contains("disabled"))
        );
    }

    #[test]
    fn test_long_report_has_timestamps_and_flags() {
        let timer = timer();
        let before = timer.long_report().to_string();
        assert!(before.contains("First start:            -"));
        assert!(before.contains("Used: false, running: false"));

        timer.start();
        timer.stop();
        let report = timer.long_report();
        assert!(report.snapshot().first_started_at.is_some());
        let text = report.to_string();
        assert!(text.contains("Created:"));
        assert!(!text.contains("First start:            -"));
        assert!(text.contains("Used: true, running: false"));
    }
}
