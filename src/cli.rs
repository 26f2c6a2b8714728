use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lapwatch", version, about = "Wall-clock and CPU time stopwatch")]
pub struct Cli {
    /// TOML configuration file (requires the `toml-config` feature)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Do not measure CPU time
    #[arg(long, global = true)]
    pub no_cpu: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time one round per duration, sleeping for each
    Rounds(RoundsArgs),

    /// Estimate the per-call cost of a busy loop
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
pub struct RoundsArgs {
    /// Round durations in milliseconds
    #[arg(required = true)]
    pub millis: Vec<u64>,

    /// Timer label
    #[arg(short, long)]
    pub label: Option<String>,

    /// Include timestamps and state flags
    #[arg(long, conflicts_with = "json")]
    pub long: bool,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BenchArgs {
    /// Iterations of the busy loop per call
    #[arg(long, default_value_t = 1_000)]
    pub spin: u64,

    /// Cumulative time to measure, in seconds
    #[arg(long)]
    pub target: Option<f64>,

    /// Calls in the first batch
    #[arg(long)]
    pub batch: Option<u64>,

    /// Log every batch (-vv) or just the summary (-v)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the estimate as JSON
    #[arg(long)]
    pub json: bool,
}
