// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between the JSON file on disk and tensor batches:
//
//   dataset.json
//       │
//       ▼
//   JsonExampleLoader    → validated RawExamples
//       │
//       ▼
//   FeaturePreprocessor  → fixed-length inputs + 4 labels
//       │
//       ▼
//   Normalizer           → rescaled rows + NormalizationStats
//       │
//       ▼
//   Splitter             → train / validation / test
//       │
//       ▼
//   ReadinessDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   ReadinessBatcher     → stacks samples into tensor batches
//
// Each stage returns a new value; nothing is mutated in place.

/// Reads and validates the JSON dataset
pub mod loader;

/// Encodes examples into numeric vectors
pub mod preprocessor;

/// Per-dimension scaling statistics
pub mod normalizer;

/// Seeded train/validation/test partitioning
pub mod splitter;

/// Implements Burn's Dataset trait for normalized rows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
