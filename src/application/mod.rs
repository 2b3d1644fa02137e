// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training a model or inspecting a dataset).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Both entry points take a PipelineConfig by value and return
// either a complete result or an error, never a partial one.

/// The explicit configuration every run is driven by
pub mod config;

/// The training workflow
pub mod train_use_case;

/// Dataset summaries without training
pub mod stats_use_case;
