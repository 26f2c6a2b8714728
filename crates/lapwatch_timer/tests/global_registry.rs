use lapwatch_timer::{
    Benchmark, EstimateOptions, PhaseProfiler, Timer, TimerRegistry, estimate_execution_time,
};

// Kept alone in its own test binary so nothing else allocates global ids.
#[test]
fn test_helpers_leave_global_ids_untouched() {
    let registry = TimerRegistry::global();
    let before = registry.allocated();

    estimate_execution_time(|| (), &EstimateOptions::with_target(0.001));
    Benchmark::new("noop", 5).run(|| ());
    let mut profiler = PhaseProfiler::new();
    profiler.record_phase("noop", || ());
    assert_eq!(registry.allocated(), before);

    let first = Timer::new();
    let second = Timer::with_label("second");
    assert_eq!(first.id(), before + 1);
    assert_eq!(second.id(), before + 2);
    assert_eq!(registry.allocated(), before + 2);
}
