// ============================================================
// Layer 2: Pipeline Configuration
// ============================================================
// Every knob of a pipeline run lives in this one struct and is
// passed explicitly into the entry points. Nothing is read from
// environment variables inside the pipeline, so two runs with
// two configs can execute side by side in tests.
//
// Serialisable so the exact configuration can be written next
// to the run's artifacts and reloaded later.

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::data::normalizer::{FitStatsOn, NormalizationStrategy};
use crate::data::preprocessor::DEFAULT_SKILL_VECTOR_LEN;
use crate::data::splitter::SplitRatios;
use crate::error::{PipelineError, Result};

/// Which model the test split is evaluated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointChoice {
    /// Lowest validation loss seen during training
    #[default]
    Best,
    /// Weights as of the last completed epoch
    Last,
}

impl FromStr for CheckpointChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "last" => Ok(Self::Last),
            other => Err(format!("unknown checkpoint '{other}' (expected best or last)")),
        }
    }
}

impl fmt::Display for CheckpointChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Best => "best",
            Self::Last => "last",
        })
    }
}

/// Stop when validation loss has not improved by `min_delta` for
/// `patience` consecutive epochs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyStoppingConfig {
    pub patience:  usize,
    pub min_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub dataset_path:        PathBuf,
    /// Where stats, config, model weights and metrics are written.
    /// `None` keeps the run entirely in memory.
    pub artifact_dir:        Option<PathBuf>,
    pub skill_vector_len:    usize,
    pub normalization:       NormalizationStrategy,
    pub fit_stats_on:        FitStatsOn,
    pub split:               SplitRatios,
    pub seed:                u64,
    pub hidden_dims:         Vec<usize>,
    pub dropout:             f64,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub learning_rate:       f64,
    pub early_stopping:      Option<EarlyStoppingConfig>,
    pub evaluate_checkpoint: CheckpointChoice,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path:        PathBuf::from("data/training_data.json"),
            artifact_dir:        None,
            skill_vector_len:    DEFAULT_SKILL_VECTOR_LEN,
            normalization:       NormalizationStrategy::MinMax,
            fit_stats_on:        FitStatsOn::All,
            split:               SplitRatios::default(),
            seed:                42,
            hidden_dims:         vec![128, 64],
            dropout:             0.1,
            batch_size:          32,
            epochs:              50,
            learning_rate:       1e-3,
            early_stopping:      None,
            evaluate_checkpoint: CheckpointChoice::Best,
        }
    }
}

impl PipelineConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(msg));

        if self.epochs == 0 {
            return invalid("epochs must be at least 1".into());
        }
        if self.batch_size == 0 {
            return invalid("batch size must be at least 1".into());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid(format!("learning rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid(format!("dropout must be in [0, 1), got {}", self.dropout));
        }
        if self.hidden_dims.iter().any(|&w| w == 0) {
            return invalid("hidden layer widths must be positive".into());
        }
        if let Some(es) = &self.early_stopping {
            if es.patience == 0 || !es.min_delta.is_finite() || es.min_delta < 0.0 {
                return invalid("early stopping needs patience >= 1 and min delta >= 0".into());
            }
        }
        self.split.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            PipelineConfig { epochs: 0, ..Default::default() },
            PipelineConfig { batch_size: 0, ..Default::default() },
            PipelineConfig { learning_rate: f64::NAN, ..Default::default() },
            PipelineConfig { dropout: 1.0, ..Default::default() },
            PipelineConfig { hidden_dims: vec![8, 0], ..Default::default() },
            PipelineConfig {
                early_stopping: Some(EarlyStoppingConfig { patience: 0, min_delta: 0.0 }),
                ..Default::default()
            },
        ];
        for cfg in cases {
            assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_json_round_trip_uses_camel_case() {
        let cfg = PipelineConfig {
            fit_stats_on: FitStatsOn::TrainOnly,
            normalization: NormalizationStrategy::ZScore,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"fitStatsOn\":\"trainOnly\""));
        assert!(json.contains("\"normalization\":\"z-score\""));
        assert!(json.contains("\"evaluateCheckpoint\":\"best\""));

        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
