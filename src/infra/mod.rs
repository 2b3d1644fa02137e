// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// File output for finished runs:
//
//   checkpoint.rs: ArtifactStore for model weights (Burn
//                  CompactRecorder), normalization stats and
//                  the pipeline config as JSON
//
//   metrics.rs: per-epoch metrics CSV
//
// Nothing here is written until a run has completed, so a
// failed or cancelled run leaves no partial artifacts.

/// Model, stats and config persistence
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
