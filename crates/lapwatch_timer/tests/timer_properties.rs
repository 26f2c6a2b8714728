use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lapwatch_timer::{
    CollectingSink, EstimateOptions, Timer, TimerRegistry, TimerWarning, Transition,
    estimate_execution_time, is_disabled,
};
use rayon::prelude::*;

const TOLERANCE: f64 = 0.05;

fn isolated_timer() -> (Timer, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let timer = Timer::builder()
        .registry(Arc::new(TimerRegistry::new()))
        .sink(sink.clone())
        .build();
    (timer, sink)
}

fn busy_for(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        spin(100);
    }
}

fn spin(iterations: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..iterations {
        acc = std::hint::black_box(acc.wrapping_mul(31).wrapping_add(i));
    }
    acc
}

#[test]
fn test_total_is_sum_of_rounds() {
    let (timer, _) = isolated_timer();
    let mut rounds = Vec::new();
    for millis in [3, 1, 4] {
        timer.start();
        thread::sleep(Duration::from_millis(millis));
        timer.stop();
        rounds.push(timer.time());
    }

    let sum: f64 = rounds.iter().sum();
    assert!((timer.total_time() - sum).abs() < 1e-9);
    assert!(timer.total_cpu_time() >= 0.0);
}

#[cfg(unix)]
#[test]
fn test_total_cpu_is_sum_of_busy_rounds() {
    let (timer, _) = isolated_timer();
    let mut rounds = Vec::new();
    for _ in 0..4 {
        timer.start();
        busy_for(Duration::from_millis(20));
        timer.stop();
        let round = timer.cpu_time();
        assert!(round > 0.0, "round cpu {round}");
        rounds.push(round);
    }

    let sum: f64 = rounds.iter().sum();
    assert!(
        (timer.total_cpu_time() - sum).abs() < 1e-9,
        "total {} vs sum {sum}",
        timer.total_cpu_time()
    );
}

#[test]
fn test_estimate_honours_disabled_cpu_clock() {
    let mut options = EstimateOptions::with_target(0.02);
    options.timer.measure_cpu_time = false;
    let estimate = estimate_execution_time(
        || {
            spin(500);
        },
        &options,
    );

    assert!(estimate.total_wall >= 0.02);
    assert!(is_disabled(estimate.total_cpu));
    assert!(is_disabled(estimate.average_cpu));
}

#[test]
fn test_misuse_leaves_readings_unchanged() {
    let (timer, sink) = isolated_timer();
    timer.start();
    thread::sleep(Duration::from_millis(2));
    timer.stop();
    let time = timer.time();
    let total = timer.total_time();

    assert_eq!(timer.stop(), Transition::Ignored);
    assert_eq!(timer.time(), time);
    assert_eq!(timer.total_time(), total);
    assert_eq!(sink.warnings(), vec![TimerWarning::NotRunning { id: 1 }]);
}

#[test]
fn test_sleep_scenario() {
    let (timer, sink) = isolated_timer();
    timer.set_label("sleep");

    timer.start();
    thread::sleep(Duration::from_millis(100));
    timer.stop();
    assert!((timer.time() - 0.1).abs() < TOLERANCE, "{}", timer.time());

    timer.start();
    thread::sleep(Duration::from_millis(50));
    timer.stop();
    assert!((timer.time() - 0.05).abs() < TOLERANCE, "{}", timer.time());
    assert!(
        (timer.total_time() - 0.15).abs() < TOLERANCE,
        "{}",
        timer.total_time()
    );

    assert!(timer.total_cpu_time() >= 0.0);
    assert!(sink.is_empty());
}

#[test]
fn test_concurrent_ids_are_unique_and_dense() {
    const N: usize = 256;
    let registry = Arc::new(TimerRegistry::new());

    let ids: Vec<u64> = (0..N)
        .into_par_iter()
        .map(|_| Timer::builder().registry(registry.clone()).build().id())
        .collect();

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), N);
    assert_eq!(unique, (1..=N as u64).collect::<HashSet<_>>());
    assert_eq!(registry.allocated(), N as u64);
}

#[test]
fn test_sequential_ids_increase() {
    let first = Timer::new();
    let second = Timer::with_label("second");
    assert!(second.id() > first.id());
}

#[test]
fn test_concurrent_start_stop_on_shared_timer() {
    let (timer, sink) = isolated_timer();
    let timer = Arc::new(timer);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let timer = Arc::clone(&timer);
            thread::spawn(move || {
                for _ in 0..200 {
                    timer.start();
                    timer.stop();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!timer.is_running());
    assert!(timer.is_used());
    assert!(timer.total_time() >= 0.0);
    for warning in sink.warnings() {
        assert_eq!(warning.timer_id(), timer.id());
    }
}

#[test]
fn test_estimate_busy_loop() {
    let options = EstimateOptions {
        target: 0.05,
        verbosity: 2,
        initial_batch: 1,
        ..EstimateOptions::default()
    };
    let estimate = estimate_execution_time(
        || {
            spin(1_000);
        },
        &options,
    );

    assert!(estimate.executions >= 1);
    assert!(estimate.batches >= 1);
    assert!(estimate.total_wall >= 0.05);
    assert!(estimate.average_wall > 0.0);
    if cfg!(unix) {
        assert!(estimate.total_cpu > 0.0, "total cpu {}", estimate.total_cpu);
        assert!(estimate.average_cpu > 0.0);
    }
    let reconstructed = estimate.average_wall * estimate.executions as f64;
    assert!((reconstructed - estimate.total_wall).abs() <= 1e-9 * estimate.total_wall.max(1.0));
    let reconstructed_cpu = estimate.average_cpu * estimate.executions as f64;
    assert!((reconstructed_cpu - estimate.total_cpu).abs() <= 1e-9 * estimate.total_cpu.max(1.0));
}

#[test]
fn test_snapshot_serializes() {
    let (timer, _) = isolated_timer();
    timer.set_label("json");
    timer.start();
    timer.stop();

    let value = serde_json::to_value(timer.snapshot()).unwrap();
    assert_eq!(value["id"], 1);
    assert_eq!(value["label"], "json");
    assert_eq!(value["running"], false);
    assert!(value["total_time"].as_f64().unwrap() >= 0.0);
}
