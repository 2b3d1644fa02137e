// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands a
// PipelineConfig to Layer 2. Results are printed as pretty
// JSON on stdout; logs go through tracing.
//
//   1. `train` runs the full pipeline and prints
//      {trainingResult, testMetrics, perOutput}
//   2. `stats` prints per-output summaries without training

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, StatsArgs, TrainArgs};

use crate::application::{stats_use_case::run_statistics, train_use_case::run_training_pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "readiness-trainer",
    version = "0.1.0",
    about = "Train a job-readiness regression model on résumé/job feature data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; never computes anything itself.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Stats(args) => run_stats(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on '{}'", args.dataset.display());
    let outcome = run_training_pipeline(args.into())?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let report = run_statistics(args.into())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
