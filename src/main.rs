use anyhow::Result;
use clap::Parser;

use cdc_fifo::{CommitMode, FifoConfig, FullTracking, HarnessConfig, ResetPulse, SelfTest};

/// Self-check driver for the dual-clock FIFO model
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// FIFO depth in items
    #[arg(long, default_value_t = 32)]
    depth: usize,

    /// Data width in bits
    #[arg(long, default_value_t = 8)]
    width: u32,

    /// Producer clock period in picoseconds
    #[arg(long, default_value_t = 10_000)]
    period_a: u64,

    /// Consumer clock period in picoseconds
    #[arg(long, default_value_t = 14_000)]
    period_b: u64,

    /// Total simulated time in picoseconds
    #[arg(long, default_value_t = 10_000_000)]
    run_ps: u64,

    /// Consumer idle ticks before the first dequeue
    #[arg(long, default_value_t = 8)]
    idle_ticks: u64,

    /// Synchronizer register stages per crossing
    #[arg(long, default_value_t = 2)]
    sync_stages: usize,

    /// Start of an injected reset pulse, in picoseconds (repeatable)
    #[arg(long)]
    reset_at: Vec<u64>,

    /// Length of each injected reset pulse, in picoseconds
    #[arg(long, default_value_t = 100_000)]
    reset_len: u64,

    /// Use the single-phase commit fallback instead of two-phase
    #[arg(long)]
    single_phase: bool,

    /// Use direct occupancy checks instead of lazy shadow tracking
    #[arg(long)]
    direct_full: bool,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = HarnessConfig {
        fifo: FifoConfig {
            data_width: cli.width,
            depth: cli.depth,
            sync_stages: cli.sync_stages,
            commit_mode: if cli.single_phase {
                CommitMode::SinglePhase
            } else {
                CommitMode::TwoPhase
            },
            full_tracking: if cli.direct_full {
                FullTracking::DirectOccupancy
            } else {
                FullTracking::LazyShadow
            },
        },
        period_a_ps: cli.period_a,
        period_b_ps: cli.period_b,
        run_ps: cli.run_ps,
        consumer_idle_ticks: cli.idle_ticks,
        reset_pulses: cli
            .reset_at
            .iter()
            .map(|&start_ps| ResetPulse {
                start_ps,
                end_ps: start_ps + cli.reset_len,
            })
            .collect(),
    };

    let mut harness = SelfTest::new(config)?;
    let report = harness.run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }

    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}
