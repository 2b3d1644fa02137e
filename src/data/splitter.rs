// ============================================================
// Layer 4: Train/Validation/Test Splitter
// ============================================================
// Partitions row indices into three disjoint sets:
//   - Training set:   used to update model weights
//   - Validation set: used to pick the best checkpoint
//   - Test set:       used once, after training, for final metrics
//
// Indices are shuffled with a Fisher-Yates shuffle
// (rand::seq::SliceRandom) driven by a StdRng seeded from the
// configuration, so the same dataset and seed always give the
// same membership.
//
// Sizing (n rows):
//   train      = floor(n * train),      at least 1
//   validation = floor(n * validation), at least 1
//   test       = everything left,       at least 1
// If test would be empty, rows are taken back from the larger of
// train/validation. Fewer than 3 rows cannot be split.
//
// The plan only depends on the row count and the seed, so it can
// be computed before normalization (train-only statistics) or
// after it (normalize-then-split) with identical results.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::normalizer::NormalizedDataset;
use crate::error::{PipelineError, Result};

/// One row per split.
pub const MIN_ROWS: usize = 3;

/// Guards floor() against products like 0.29 * 100 = 28.999...
const RATIO_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train:      f64,
    pub validation: f64,
    pub test:       f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.7, validation: 0.15, test: 0.15 }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ] {
            if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} ratio must be in (0, 1], got {ratio}"
                )));
            }
        }

        let sum = self.train + self.validation + self.test;
        if sum > 1.0 + RATIO_EPSILON {
            return Err(PipelineError::InvalidConfig(format!(
                "split ratios sum to {sum}, which exceeds 1"
            )));
        }
        Ok(())
    }
}

/// Row indices for each split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub train:      Vec<usize>,
    pub validation: Vec<usize>,
    pub test:       Vec<usize>,
}

/// The three normalized subsets handed to the trainer.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub train:      NormalizedDataset,
    pub validation: NormalizedDataset,
    pub test:       NormalizedDataset,
}

pub struct Splitter {
    ratios: SplitRatios,
    seed:   u64,
}

impl Splitter {
    pub fn new(ratios: SplitRatios, seed: u64) -> Self {
        Self { ratios, seed }
    }

    /// Shuffle `0..rows` and cut it into train/validation/test.
    pub fn plan(&self, rows: usize) -> Result<SplitPlan> {
        self.ratios.validate()?;
        if rows < MIN_ROWS {
            return Err(PipelineError::InsufficientData { rows, required: MIN_ROWS });
        }

        let (n_train, n_val) = split_sizes(rows, &self.ratios);

        let mut indices: Vec<usize> = (0..rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        // split_off(n) leaves [0..n) behind and returns [n..)
        let test       = indices.split_off(n_train + n_val);
        let validation = indices.split_off(n_train);
        let train      = indices;

        tracing::debug!(
            "Split plan: {} train, {} validation, {} test (seed {})",
            train.len(),
            validation.len(),
            test.len(),
            self.seed
        );

        Ok(SplitPlan { train, validation, test })
    }

    /// Plan and materialize the three subsets of `data`.
    pub fn split(&self, data: &NormalizedDataset) -> Result<SplitDataset> {
        let plan = self.plan(data.len())?;
        Ok(Self::apply(data, &plan))
    }

    pub fn apply(data: &NormalizedDataset, plan: &SplitPlan) -> SplitDataset {
        SplitDataset {
            train:      data.select(&plan.train),
            validation: data.select(&plan.validation),
            test:       data.select(&plan.test),
        }
    }
}

/// (train, validation) sizes; test receives `rows - train - validation`.
/// Requires `rows >= MIN_ROWS`.
fn split_sizes(rows: usize, ratios: &SplitRatios) -> (usize, usize) {
    let portion = |ratio: f64| ((rows as f64 * ratio + RATIO_EPSILON).floor() as usize).max(1);

    let mut train = portion(ratios.train);
    let mut val   = portion(ratios.validation);

    while train + val > rows - 1 {
        if train >= val {
            train -= 1;
        } else {
            val -= 1;
        }
    }
    (train, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::data::normalizer::{NormalizationStrategy, Normalizer};
    use crate::data::preprocessor::FeaturePreprocessor;
    use crate::domain::example::{Labels, RawExample};

    fn assert_partition(plan: &SplitPlan, rows: usize) {
        let mut seen = HashSet::new();
        for idx in plan.train.iter().chain(&plan.validation).chain(&plan.test) {
            assert!(seen.insert(*idx), "row {idx} appears twice");
        }
        assert_eq!(seen.len(), rows);
        assert!(seen.iter().all(|&i| i < rows));
        assert!(!plan.train.is_empty() && !plan.validation.is_empty() && !plan.test.is_empty());
    }

    fn normalized(rows: u32) -> NormalizedDataset {
        let examples: Vec<RawExample> = (0..rows)
            .map(|i| {
                RawExample::new(i, 5, Labels {
                    readiness_score: f64::from(i),
                    missing_skills:  1.0,
                    matched_skills:  2.0,
                    weeks_to_learn:  3.0,
                })
            })
            .collect();
        let processed = FeaturePreprocessor::new(1).process(&examples).unwrap();
        Normalizer::new(NormalizationStrategy::MinMax).normalize(&processed).unwrap()
    }

    #[test]
    fn test_split_matches_plan_and_apply() {
        let data = normalized(40);
        let splitter = Splitter::new(SplitRatios::default(), 11);

        let splits = splitter.split(&data).unwrap();
        let expected = Splitter::apply(&data, &splitter.plan(data.len()).unwrap());

        let subsets = [
            (&splits.train, &expected.train),
            (&splits.validation, &expected.validation),
            (&splits.test, &expected.test),
        ];
        for (got, want) in subsets {
            assert_eq!(got.len(), want.len());
            assert_eq!(got.inputs(), want.inputs());
            assert_eq!(got.outputs(), want.outputs());
        }

        // every score is unique, so it identifies the source row
        let mut scores: Vec<f64> = [&splits.train, &splits.validation, &splits.test]
            .into_iter()
            .flat_map(|s| s.outputs().iter().map(|o| o[0]))
            .collect();
        scores.sort_by(f64::total_cmp);
        let all: Vec<f64> = data.outputs().iter().map(|o| o[0]).collect();
        assert_eq!(scores, all);
    }

    #[test]
    fn test_split_rejects_tiny_dataset() {
        let err = Splitter::new(SplitRatios::default(), 0).split(&normalized(2)).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { rows: 2, required: 3 }));
    }

    #[test]
    fn test_default_split_sizes() {
        let plan = Splitter::new(SplitRatios::default(), 42).plan(100).unwrap();
        assert_eq!(plan.train.len(), 70);
        assert_eq!(plan.validation.len(), 15);
        assert_eq!(plan.test.len(), 15);
    }

    #[test]
    fn test_is_true_partition_for_many_configs() {
        let configs = [
            SplitRatios::default(),
            SplitRatios { train: 0.8, validation: 0.1, test: 0.1 },
            SplitRatios { train: 0.5, validation: 0.2, test: 0.1 },
            SplitRatios { train: 0.34, validation: 0.33, test: 0.33 },
        ];
        for ratios in configs {
            for rows in [3, 4, 7, 20, 101] {
                let plan = Splitter::new(ratios, 7).plan(rows).unwrap();
                assert_partition(&plan, rows);
            }
        }
    }

    #[test]
    fn test_same_seed_same_membership() {
        let a = Splitter::new(SplitRatios::default(), 1234).plan(50).unwrap();
        let b = Splitter::new(SplitRatios::default(), 1234).plan(50).unwrap();
        assert_eq!(a, b);

        let c = Splitter::new(SplitRatios::default(), 4321).plan(50).unwrap();
        assert_ne!(a.train, c.train);
    }

    #[test]
    fn test_three_rows_one_each() {
        let plan = Splitter::new(SplitRatios::default(), 0).plan(3).unwrap();
        assert_eq!(
            (plan.train.len(), plan.validation.len(), plan.test.len()),
            (1, 1, 1)
        );
    }

    #[test]
    fn test_too_few_rows() {
        for rows in [0, 1, 2] {
            assert!(matches!(
                Splitter::new(SplitRatios::default(), 0).plan(rows).unwrap_err(),
                PipelineError::InsufficientData { required: 3, .. }
            ));
        }
    }

    #[test]
    fn test_slack_goes_to_test() {
        let ratios = SplitRatios { train: 0.5, validation: 0.2, test: 0.1 };
        let plan = Splitter::new(ratios, 3).plan(10).unwrap();
        assert_eq!(plan.train.len(), 5);
        assert_eq!(plan.validation.len(), 2);
        assert_eq!(plan.test.len(), 3);
    }

    #[test]
    fn test_invalid_ratios() {
        for ratios in [
            SplitRatios { train: 0.8, validation: 0.2, test: 0.2 },
            SplitRatios { train: 0.0, validation: 0.5, test: 0.5 },
            SplitRatios { train: f64::NAN, validation: 0.1, test: 0.1 },
        ] {
            assert!(matches!(
                Splitter::new(ratios, 0).plan(10).unwrap_err(),
                PipelineError::InvalidConfig(_)
            ));
        }
    }
}
