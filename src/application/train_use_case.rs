// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load raw examples            (Layer 4 - data)
//   Step 3: Encode features and labels   (Layer 4 - data)
//   Step 4: Plan the seeded split        (Layer 4 - data)
//   Step 5: Fit stats and normalize      (Layer 4 - data)
//   Step 6: Materialize the three splits (Layer 4 - data)
//   Step 7: Run the training loop        (Layer 5 - ml)
//   Step 8: Evaluate on the test split   (Layer 5 - ml)
//   Step 9: Save artifacts               (Layer 6 - infra)
//
// The split plan depends only on the row count and seed, so it
// is drawn before normalization. That lets the stats be fitted on
// either every row or the training rows alone without changing
// which rows land in which split.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::config::{CheckpointChoice, PipelineConfig};
use crate::data::{
    loader::JsonExampleLoader,
    normalizer::{FitStatsOn, Normalizer},
    preprocessor::FeaturePreprocessor,
    splitter::Splitter,
};
use crate::domain::traits::ExampleSource;
use crate::infra::{
    checkpoint::{ArtifactStore, CheckpointInfo},
    metrics::MetricsLogger,
};
use crate::ml::{
    evaluator::{evaluate, OutputMetrics, TestMetrics},
    trainer::{run_training, CancellationToken, TrainingOutcome, TrainingResult},
};

/// Everything a successful run reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub training_result: TrainingResult,
    pub test_metrics:    TestMetrics,
    pub per_output:      Vec<OutputMetrics>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: PipelineConfig,
    source: Box<dyn ExampleSource>,
    cancel: CancellationToken,
}

impl TrainUseCase {
    /// Read examples from `config.dataset_path`.
    pub fn new(config: PipelineConfig) -> Self {
        let source = JsonExampleLoader::new(config.dataset_path.clone());
        Self::with_source(config, source)
    }

    /// Read examples from any other source.
    pub fn with_source(config: PipelineConfig, source: impl ExampleSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
            cancel: CancellationToken::new(),
        }
    }

    /// Share a token the caller can use to stop the run between epochs.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<PipelineOutcome> {
        let cfg = &self.config;

        // ── Step 1: Configuration ─────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load ──────────────────────────────────────────────────────
        let examples = self.source.load_all()?;
        tracing::info!("Loaded {} examples", examples.len());

        // ── Step 3: Preprocess ────────────────────────────────────────────────
        let preprocessor = FeaturePreprocessor::new(cfg.skill_vector_len);
        let processed = preprocessor.process(&examples)?;
        tracing::info!(
            "Encoded {} rows into {} inputs / {} outputs",
            processed.len(),
            processed.metadata().input_dimensions,
            processed.metadata().output_dimensions
        );

        // ── Step 4: Split plan ────────────────────────────────────────────────
        let plan = Splitter::new(cfg.split, cfg.seed).plan(processed.len())?;
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            plan.train.len(),
            plan.validation.len(),
            plan.test.len()
        );

        // ── Step 5: Normalize ─────────────────────────────────────────────────
        let pool: Vec<usize> = match cfg.fit_stats_on {
            FitStatsOn::All       => (0..processed.len()).collect(),
            FitStatsOn::TrainOnly => plan.train.clone(),
        };
        let normalized = Normalizer::new(cfg.normalization).normalize_with_pool(&processed, &pool)?;

        // ── Step 6: Materialize splits ────────────────────────────────────────
        let splits = Splitter::apply(&normalized, &plan);

        // ── Step 7: Train (Layer 5) ───────────────────────────────────────────
        let TrainingOutcome { result, model } = run_training(cfg, &splits, &self.cancel)?;

        // ── Step 8: Test evaluation ───────────────────────────────────────────
        let evaluation = evaluate(&model, &splits.test, &Default::default())?;
        tracing::info!(
            "Test ({} checkpoint): loss={:.6} mae={:.6}",
            result.evaluated_checkpoint,
            evaluation.metrics.test_loss,
            evaluation.metrics.test_mae
        );

        // ── Step 9: Artifacts ─────────────────────────────────────────────────
        if let Some(dir) = &cfg.artifact_dir {
            let store = ArtifactStore::new(dir)?;
            store.save_config(cfg)?;
            store.save_stats(normalized.stats())?;

            let info = match result.evaluated_checkpoint {
                CheckpointChoice::Best => CheckpointInfo {
                    tag:      "best".into(),
                    epoch:    result.best_epoch,
                    val_loss: result.best_val_loss,
                },
                CheckpointChoice::Last => CheckpointInfo {
                    tag:      "last".into(),
                    epoch:    result.epochs,
                    val_loss: result.final_val_loss,
                },
            };
            store.save_model(&model, &info)?;
            MetricsLogger::new(dir)?.log_all(&result.history)?;
            tracing::info!("Artifacts written to '{}'", dir.display());
        }

        Ok(PipelineOutcome {
            training_result: result,
            test_metrics:    evaluation.metrics,
            per_output:      evaluation.per_output,
        })
    }
}

/// Load, preprocess, normalize, split, train and evaluate.
pub fn run_training_pipeline(config: PipelineConfig) -> Result<PipelineOutcome> {
    let dataset = config.dataset_path.clone();
    TrainUseCase::new(config)
        .execute()
        .with_context(|| format!("Training pipeline failed for '{}'", dataset.display()))
}
