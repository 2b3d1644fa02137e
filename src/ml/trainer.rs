// ============================================================
// Layer 5: Training Loop
// ============================================================
// Mini-batch train + validation loop using Burn's DataLoader and Adam.
//
//   - Training runs on TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() gives the same weights on the inner NdArray
//     backend with dropout off; train/val losses are measured there
//   - the best (lowest val loss) snapshot is threaded through the
//     loop as a value, never written to shared state
//   - cancellation and early stopping are checked between epochs
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::config::{CheckpointChoice, EarlyStoppingConfig, PipelineConfig};
use crate::data::{
    batcher::{ReadinessBatch, ReadinessBatcher},
    dataset::ReadinessDataset,
    splitter::SplitDataset,
};
use crate::error::{PipelineError, Result};
use crate::infra::metrics::EpochMetrics;
use crate::ml::evaluator::split_loss;
use crate::ml::model::{ReadinessModel, ReadinessModelConfig};

pub type TrainBackend = Autodiff<NdArray>;
pub type EvalBackend = NdArray;

// ─── CancellationToken ────────────────────────────────────────────────────────
/// Shared flag a caller flips to stop training at the next epoch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ─── BestCheckpoint ───────────────────────────────────────────────────────────
/// Lowest-validation-loss snapshot seen so far.
#[derive(Debug, Clone)]
pub struct BestCheckpoint<M> {
    pub epoch:    usize,
    pub val_loss: f64,
    pub model:    M,
}

impl<M> BestCheckpoint<M> {
    /// Fold one epoch into the accumulator. Only a strictly lower
    /// validation loss replaces the current best.
    pub fn advance(best: Option<Self>, epoch: usize, val_loss: f64, model: M) -> Self {
        match best {
            Some(best) if val_loss >= best.val_loss => best,
            _ => Self { epoch, val_loss, model },
        }
    }
}

// ─── EarlyStopper ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EarlyStopper {
    patience:  usize,
    min_delta: f64,
    best:      f64,
    waited:    usize,
}

impl EarlyStopper {
    pub fn new(cfg: EarlyStoppingConfig) -> Self {
        Self {
            patience:  cfg.patience,
            min_delta: cfg.min_delta,
            best:      f64::INFINITY,
            waited:    0,
        }
    }

    /// Record an epoch's validation loss; true once patience runs out.
    pub fn should_stop(&mut self, val_loss: f64) -> bool {
        if val_loss < self.best - self.min_delta {
            self.best = val_loss;
            self.waited = 0;
            false
        } else {
            self.waited += 1;
            self.waited >= self.patience
        }
    }
}

// ─── Results ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingResult {
    /// Epochs actually completed
    pub epochs:               usize,
    pub final_loss:           f64,
    pub final_val_loss:       f64,
    pub best_val_loss:        f64,
    pub best_epoch:           usize,
    pub stopped_early:        bool,
    pub evaluated_checkpoint: CheckpointChoice,
    /// Wall time in milliseconds
    pub duration:             u64,
    pub history:              Vec<EpochMetrics>,
}

/// Training summary plus the model selected for evaluation.
pub struct TrainingOutcome<B: Backend> {
    pub result: TrainingResult,
    pub model:  ReadinessModel<B>,
}

/// Train on the CPU NdArray backend.
pub fn run_training(
    cfg:    &PipelineConfig,
    splits: &SplitDataset,
    cancel: &CancellationToken,
) -> Result<TrainingOutcome<EvalBackend>> {
    let device = NdArrayDevice::default();
    tracing::debug!("Using NdArray device: {:?}", device);
    train_loop::<TrainBackend>(cfg, splits, cancel, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:    &PipelineConfig,
    splits: &SplitDataset,
    cancel: &CancellationToken,
    device: B::Device,
) -> Result<TrainingOutcome<B::InnerBackend>> {
    for (name, split) in [
        ("train", &splits.train),
        ("validation", &splits.validation),
        ("test", &splits.test),
    ] {
        if split.is_empty() {
            return Err(PipelineError::EmptySplit { split: name });
        }
    }
    if cfg.epochs == 0 {
        return Err(PipelineError::InvalidConfig("epochs must be at least 1".into()));
    }

    let started = Instant::now();
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let input_dim = splits.train.metadata().input_dimensions;
    let mut model: ReadinessModel<B> = ReadinessModelConfig::new(input_dim, cfg.hidden_dims.clone())
        .with_dropout(cfg.dropout)
        .init(&device);
    tracing::info!(
        "Model ready: {} → {:?} → {}",
        input_dim,
        cfg.hidden_dims,
        splits.train.metadata().output_dimensions
    );

    let mut optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .init::<B, ReadinessModel<B>>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    // shuffle(seed) reshuffles on every pass through the loader
    let train_loader = DataLoaderBuilder::new(ReadinessBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(ReadinessDataset::from_normalized(&splits.train));

    // ── Full-split batches for loss measurement (InnerBackend) ───────────────
    let train_eval = ReadinessBatch::<B::InnerBackend>::from_dataset(&splits.train, &device);
    let val_eval   = ReadinessBatch::<B::InnerBackend>::from_dataset(&splits.validation, &device);

    let mut stopper = cfg.early_stopping.map(EarlyStopper::new);
    let mut best: Option<BestCheckpoint<ReadinessModel<B::InnerBackend>>> = None;
    let mut history = Vec::with_capacity(cfg.epochs);
    let mut stopped_early = false;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        if cancel.is_cancelled() {
            tracing::warn!("Training cancelled before epoch {}", epoch);
            return Err(PipelineError::Cancelled { completed_epochs: epoch - 1 });
        }

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.inputs, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(PipelineError::TrainingDiverged { epoch, loss: loss_val });
            }

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        // dropout disabled, no autodiff graph
        let model_valid = model.valid();
        let (train_loss, _)     = split_loss(&model_valid, &train_eval);
        let (val_loss, val_mae) = split_loss(&model_valid, &val_eval);
        if !train_loss.is_finite() || !val_loss.is_finite() {
            let loss = if train_loss.is_finite() { val_loss } else { train_loss };
            return Err(PipelineError::TrainingDiverged { epoch, loss });
        }

        let metrics = EpochMetrics::new(epoch, train_loss, val_loss, val_mae);
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.6} | val_loss={:.6} | val_mae={:.6}",
            epoch, cfg.epochs, train_loss, val_loss, val_mae,
        );
        if best.as_ref().map_or(true, |b| metrics.is_improvement(b.val_loss)) {
            tracing::debug!("New best validation loss at epoch {}", epoch);
        }
        history.push(metrics);

        best = Some(BestCheckpoint::advance(best, epoch, val_loss, model_valid));

        if stopper.as_mut().is_some_and(|s| s.should_stop(val_loss)) {
            tracing::info!("Early stopping after epoch {}", epoch);
            stopped_early = true;
            break;
        }
    }

    let (Some(best), Some(last)) = (best, history.last().copied()) else {
        return Err(PipelineError::InvalidConfig("no epoch completed".into()));
    };

    let model = match cfg.evaluate_checkpoint {
        CheckpointChoice::Best => best.model,
        CheckpointChoice::Last => model.valid(),
    };

    let result = TrainingResult {
        epochs: last.epoch,
        final_loss: last.train_loss,
        final_val_loss: last.val_loss,
        best_val_loss: best.val_loss,
        best_epoch: best.epoch,
        stopped_early,
        evaluated_checkpoint: cfg.evaluate_checkpoint,
        duration: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        history,
    };

    tracing::info!(
        "Training complete: {} epochs, best val_loss={:.6} at epoch {}",
        result.epochs,
        result.best_val_loss,
        result.best_epoch
    );
    Ok(TrainingOutcome { result, model })
}
