// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// Model definition, training and evaluation. Batching into
// tensors happens in Layer 4; this layer owns everything that
// runs the network.
//
//   model.rs      feed-forward regressor
//                 input_dim -> hidden (ReLU, dropout)... -> 4
//
//   trainer.rs    the epoch loop: shuffled mini-batches, Adam
//                 updates, eval-mode train/val loss, the best
//                 checkpoint accumulator, early stopping and
//                 cancellation between epochs
//
//   evaluator.rs  MSE/MAE on a split and per-output
//                 mse/rmse/mae/r2 on the test split
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Feed-forward regression model
pub mod model;

/// Training loop with validation and best-checkpoint tracking
pub mod trainer;

/// Test-split metrics
pub mod evaluator;
