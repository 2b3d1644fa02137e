// ============================================================
// Layer 6: Metrics Logger
// ============================================================
// Records per-epoch training metrics to a CSV file so learning
// curves can be plotted after the run.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: MSE over the full training split (eval mode)
//   - val_loss:   MSE over the validation split
//   - val_mae:    mean absolute error over the validation split
//
// Output file: <artifact_dir>/metrics.csv
//
//   epoch,train_loss,val_loss,val_mae
//   1,0.084512,0.091230,0.241100
//   2,0.051034,0.060118,0.190520
//   ...
//
// If val_loss climbs while train_loss keeps falling, the model
// is overfitting and the best checkpoint is the one to keep.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    pub train_loss: f64,

    pub val_loss: f64,

    pub val_mae: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_mae: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_mae }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Writes epoch metrics to a CSV file.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the CSV (replacing any previous run's file) and write the header.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss,val_mae")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.val_mae,
        )?;
        Ok(())
    }

    pub fn log_all(&self, history: &[EpochMetrics]) -> Result<()> {
        for m in history {
            self.log(m)?;
        }
        tracing::debug!(
            "Logged {} epochs to '{}'",
            history.len(),
            self.csv_path.display()
        );
        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
