//! Clock sampling primitives
//!
//! Wall time comes from the monotonic [`Instant`] clock. CPU time is the total
//! processor time consumed by the whole process; there is no per-thread
//! variant.

use std::time::Instant;

/// Sample the monotonic wall clock
#[inline]
pub fn wall_now() -> Instant {
    Instant::now()
}

/// Processor time (user + system) consumed by the current process, in seconds
///
/// Returns `0.0` when the platform offers no process CPU clock or the read
/// fails.
#[cfg(unix)]
pub fn process_cpu_time() -> f64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if ret != 0 {
        return 0.0;
    }
    ts.tv_sec as f64 + ts.tv_nsec as f64 * 1e-9
}

#[cfg(not(unix))]
pub fn process_cpu_time() -> f64 {
    0.0
}

/// One paired sample of both clocks
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sample {
    pub wall: Instant,
    pub cpu: f64,
}

impl Sample {
    pub fn now() -> Self {
        Self {
            wall: wall_now(),
            cpu: process_cpu_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_cpu_time_is_monotonic() {
        let before = process_cpu_time();
        let mut acc = 0u64;
        for i in 0..200_000u64 {
            acc = acc.wrapping_add(i * i);
        }
        std::hint::black_box(acc);
        let after = process_cpu_time();
        assert!(after >= before);
    }

    #[cfg(unix)]
    #[test]
    fn test_process_cpu_time_advances_under_load() {
        let before = process_cpu_time();
        let start = wall_now();
        let mut acc = 0u64;
        while start.elapsed().as_millis() < 30 {
            acc = std::hint::black_box(acc.wrapping_add(1));
        }
        assert!(process_cpu_time() > before);
    }
}
