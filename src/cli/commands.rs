// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `stats`, and their
// flags. Enum-valued flags parse through each type's FromStr.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::config::{CheckpointChoice, EarlyStoppingConfig, PipelineConfig};
use crate::data::normalizer::{FitStatsOn, NormalizationStrategy};
use crate::data::splitter::SplitRatios;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the readiness model and report test metrics
    Train(TrainArgs),

    /// Summarize a dataset without training
    Stats(StatsArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON array of labelled examples
    #[arg(long, default_value = "data/training_data.json")]
    pub dataset: PathBuf,

    /// Directory for stats, config, model weights and metrics.csv
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// min-max or z-score
    #[arg(long, default_value = "min-max")]
    pub normalization: NormalizationStrategy,

    /// Fit normalization stats on `all` rows or `train-only`
    #[arg(long, default_value = "all")]
    pub fit_stats_on: FitStatsOn,

    #[arg(long, default_value_t = 0.7)]
    pub train_ratio: f64,

    #[arg(long, default_value_t = 0.15)]
    pub val_ratio: f64,

    #[arg(long, default_value_t = 0.15)]
    pub test_ratio: f64,

    /// Seed for the split, weight init and batch order
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Width of each résumé/job skill vector
    #[arg(long, default_value_t = 40)]
    pub skill_vector_len: usize,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "128,64")]
    pub hidden: Vec<usize>,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Stop after this many epochs without validation improvement
    #[arg(long)]
    pub patience: Option<usize>,

    /// Smallest validation loss drop that counts as improvement
    #[arg(long, default_value_t = 0.0)]
    pub min_delta: f64,

    /// Evaluate the test split with the `best` or `last` model
    #[arg(long, default_value = "best")]
    pub checkpoint: CheckpointChoice,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for PipelineConfig {
    fn from(a: TrainArgs) -> Self {
        PipelineConfig {
            dataset_path:        a.dataset,
            artifact_dir:        a.artifact_dir,
            skill_vector_len:    a.skill_vector_len,
            normalization:       a.normalization,
            fit_stats_on:        a.fit_stats_on,
            split: SplitRatios {
                train:      a.train_ratio,
                validation: a.val_ratio,
                test:       a.test_ratio,
            },
            seed:                a.seed,
            hidden_dims:         a.hidden,
            dropout:             a.dropout,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            learning_rate:       a.lr,
            early_stopping:      a.patience.map(|patience| EarlyStoppingConfig {
                patience,
                min_delta: a.min_delta,
            }),
            evaluate_checkpoint: a.checkpoint,
        }
    }
}

/// All arguments for the `stats` command
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[arg(long, default_value = "data/training_data.json")]
    pub dataset: PathBuf,

    #[arg(long, default_value = "min-max")]
    pub normalization: NormalizationStrategy,

    #[arg(long, default_value_t = 40)]
    pub skill_vector_len: usize,
}

impl From<StatsArgs> for PipelineConfig {
    fn from(a: StatsArgs) -> Self {
        PipelineConfig {
            dataset_path:     a.dataset,
            normalization:    a.normalization,
            skill_vector_len: a.skill_vector_len,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "readiness-trainer", "train",
            "--dataset", "rows.json",
            "--normalization", "z-score",
            "--fit-stats-on", "train-only",
            "--hidden", "32,16,8",
            "--patience", "3",
            "--checkpoint", "last",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = PipelineConfig::from(args);
        assert_eq!(cfg.dataset_path, PathBuf::from("rows.json"));
        assert_eq!(cfg.normalization, NormalizationStrategy::ZScore);
        assert_eq!(cfg.fit_stats_on, FitStatsOn::TrainOnly);
        assert_eq!(cfg.hidden_dims, vec![32, 16, 8]);
        assert_eq!(cfg.early_stopping.map(|e| e.patience), Some(3));
        assert_eq!(cfg.evaluate_checkpoint, CheckpointChoice::Last);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["readiness-trainer", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(PipelineConfig::from(args), PipelineConfig::default());
    }

    #[test]
    fn test_bad_enum_value_is_rejected() {
        let res = Cli::try_parse_from(["readiness-trainer", "stats", "--normalization", "log"]);
        assert!(res.is_err());
    }
}
