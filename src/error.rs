// ============================================================
// Pipeline Error Taxonomy
// ============================================================
// Every stage of the pipeline (load → preprocess → normalize →
// split → train) fails with one of these variants. They travel
// unchanged up to the application layer, which wraps them in
// anyhow with context. Callers recover the typed value with
// `err.downcast_ref::<PipelineError>()`.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used by the data and ml layers.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dataset source is unreadable or is not an array of records.
    #[error("cannot load dataset '{path}': {reason}")]
    DataLoad { path: PathBuf, reason: String },

    /// A record is missing a required field or has a wrongly typed one.
    #[error("schema error in example {index} at '{field}': {reason}")]
    Schema {
        index:  usize,
        field:  String,
        reason: String,
    },

    /// A label is NaN or infinite.
    #[error("example {index} has a non-finite '{label}' label ({value})")]
    InvalidLabel {
        index: usize,
        label: &'static str,
        value: f64,
    },

    /// An input feature is NaN or infinite.
    #[error("example {index} has a non-finite feature '{field}'")]
    InvalidFeature { index: usize, field: String },

    /// Too few rows to give every split at least one row.
    #[error("insufficient data: {rows} rows available, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    /// A split handed to the trainer has no rows.
    #[error("the {split} split is empty")]
    EmptySplit { split: &'static str },

    /// Loss became NaN or infinite; training halted.
    #[error("training diverged at epoch {epoch}: loss = {loss}")]
    TrainingDiverged { epoch: usize, loss: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The caller cancelled the run between epochs.
    #[error("training cancelled after {completed_epochs} completed epochs")]
    Cancelled { completed_epochs: usize },
}
