mod cli;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use cli::{BenchArgs, Cli, Command, RoundsArgs};
use lapwatch_config::LapwatchConfig;
use lapwatch_timer::{EstimateOptions, Timer, estimate_execution_time};

fn main() -> Result<()> {
    lapwatch_utils::init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LapwatchConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .merge_with_env(),
        None => LapwatchConfig::from_env(),
    };
    if cli.no_cpu {
        config.timer.measure_cpu_time = false;
    }
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Rounds(args) => run_rounds(&config, args),
        Command::Bench(args) => run_bench(&config, &args),
    }
}

fn run_rounds(config: &LapwatchConfig, args: RoundsArgs) -> Result<()> {
    let mut builder = Timer::builder().config(config.timer.clone());
    if let Some(label) = args.label {
        builder = builder.label(label);
    }
    let timer = builder.build();

    for (round, millis) in args.millis.iter().enumerate() {
        timer.measure(|| thread::sleep(Duration::from_millis(*millis)));
        if !args.json {
            println!(
                "{} {:>3}: {:.6} s",
                "round".bold(),
                round + 1,
                timer.time()
            );
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&timer.snapshot())?);
    } else if args.long {
        print!("{}", timer.long_report());
    } else {
        print!("{timer}");
    }
    Ok(())
}

fn run_bench(config: &LapwatchConfig, args: &BenchArgs) -> Result<()> {
    let mut options = EstimateOptions::from(config);
    if let Some(target) = args.target {
        options.target = target;
    }
    if let Some(batch) = args.batch {
        options.initial_batch = batch;
    }
    options.verbosity = options.verbosity.max(args.verbose);

    let spin = args.spin;
    let estimate = estimate_execution_time(
        || {
            let mut acc = 0u64;
            for i in 0..spin {
                acc = std::hint::black_box(acc.wrapping_mul(31).wrapping_add(i));
            }
            std::hint::black_box(acc);
        },
        &options,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!(
        "{} {} calls in {} batches",
        "estimated".green().bold(),
        estimate.executions,
        estimate.batches
    );
    println!("  average wall: {:.9} s", estimate.average_wall);
    println!("  average cpu:  {:.9} s", estimate.average_cpu);
    println!(
        "  measured:     {:.6} s wall, {:.6} s cpu",
        estimate.total_wall, estimate.total_cpu
    );
    Ok(())
}
