//! # Rollout
//!
//! Entry point of the rollout binary. Parses the command line, sets up
//! logging and prints the mean return once every episode has run.

use anyhow::Result;
use clap::Parser;
use rollout::Args;
use tracing::Level;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let summary = rollout::run(&args)?;
    println!(
        "seed {}: mean return {:.3} over {} episode(s)",
        summary.seed,
        summary.mean_return(),
        summary.episodes.len()
    );
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}
