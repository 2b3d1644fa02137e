// ============================================================
// Layer 4: Normalizer
// ============================================================
// Rescales every input and output dimension independently.
//
//   min-max:  x' = (x - min)  / (max - min)   → [0, 1]
//   z-score:  x' = (x - mean) / std           → mean 0, std 1
//
// A dimension with zero width (max == min) or zero variance
// uses a scale of 1, so it maps to a constant instead of
// dividing by zero, and inverts back to the same constant.
//
// Statistics are fitted once from an explicit pool of row
// indices and are immutable afterwards. The pipeline decides
// the pool: every row (normalize-then-split, the default) or
// only the training rows (strict, no validation/test leakage).
// The stats travel with the normalized data behind an Arc so
// predictions can be mapped back to label units later.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::data::preprocessor::{DatasetMetadata, ProcessedDataset};
use crate::domain::example::LABEL_COUNT;
use crate::error::{PipelineError, Result};

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationStrategy {
    #[default]
    MinMax,
    ZScore,
}

impl FromStr for NormalizationStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min-max" | "minmax" => Ok(Self::MinMax),
            "z-score" | "zscore" => Ok(Self::ZScore),
            other => Err(format!("unknown normalization '{other}' (expected min-max or z-score)")),
        }
    }
}

impl fmt::Display for NormalizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MinMax => "min-max",
            Self::ZScore => "z-score",
        })
    }
}

/// Which rows the statistics are fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FitStatsOn {
    /// Every row, before splitting. Validation and test rows influence
    /// the scale the model trains on.
    #[default]
    All,
    /// Training rows only.
    TrainOnly,
}

impl FromStr for FitStatsOn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "train-only" | "trainonly" | "train" => Ok(Self::TrainOnly),
            other => Err(format!("unknown stats pool '{other}' (expected all or train-only)")),
        }
    }
}

// ─── Statistics ───────────────────────────────────────────────────────────────
/// Summary of one dimension over the fitted pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionStats {
    pub min:  f64,
    pub max:  f64,
    pub mean: f64,
    /// Population standard deviation
    pub std:  f64,
}

impl DimensionStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut min   = f64::INFINITY;
        let mut max   = f64::NEG_INFINITY;
        let mut sum   = 0.0;
        let mut count = 0usize;
        let mut seen  = Vec::new();

        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
            seen.push(v);
        }

        // Summing an inexact value such as 0.7 drifts, so a constant
        // column is pinned to its exact value and zero spread.
        if min == max {
            return Self { min, max, mean: min, std: 0.0 };
        }

        let mean = sum / count.max(1) as f64;
        let variance = seen.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count.max(1) as f64;

        Self { min, max, mean, std: variance.sqrt() }
    }

    pub fn is_constant(&self) -> bool {
        self.max == self.min
    }

    /// (offset, scale) such that x' = (x - offset) / scale.
    fn offset_scale(&self, strategy: NormalizationStrategy) -> (f64, f64) {
        let (offset, width) = match strategy {
            NormalizationStrategy::MinMax => (self.min, self.max - self.min),
            NormalizationStrategy::ZScore => (self.mean, self.std),
        };
        let negligible = width <= f64::EPSILON * offset.abs().max(1.0);
        let scale = if self.is_constant() || negligible { 1.0 } else { width };
        (offset, scale)
    }

    pub fn normalize(&self, strategy: NormalizationStrategy, value: f64) -> f64 {
        let (offset, scale) = self.offset_scale(strategy);
        (value - offset) / scale
    }

    pub fn denormalize(&self, strategy: NormalizationStrategy, value: f64) -> f64 {
        let (offset, scale) = self.offset_scale(strategy);
        value * scale + offset
    }
}

/// Per-dimension statistics for the input and output spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationStats {
    pub strategy:    NormalizationStrategy,
    /// Number of rows the statistics were fitted on
    pub fitted_rows: usize,
    pub inputs:      Vec<DimensionStats>,
    pub outputs:     Vec<DimensionStats>,
}

impl NormalizationStats {
    /// Fit statistics over the rows listed in `pool`.
    pub fn fit(
        data:     &ProcessedDataset,
        pool:     &[usize],
        strategy: NormalizationStrategy,
    ) -> Result<Self> {
        if pool.is_empty() {
            return Err(PipelineError::InsufficientData { rows: 0, required: 1 });
        }

        let inputs = (0..data.metadata().input_dimensions)
            .map(|d| DimensionStats::from_values(pool.iter().map(|&r| data.inputs()[r][d])))
            .collect();
        let outputs = (0..LABEL_COUNT)
            .map(|d| DimensionStats::from_values(pool.iter().map(|&r| data.outputs()[r][d])))
            .collect();

        Ok(Self { strategy, fitted_rows: pool.len(), inputs, outputs })
    }

    pub fn normalize_input(&self, raw: &[f64]) -> Vec<f64> {
        self.inputs
            .iter()
            .zip(raw)
            .map(|(s, &v)| s.normalize(self.strategy, v))
            .collect()
    }

    pub fn denormalize_input(&self, scaled: &[f64]) -> Vec<f64> {
        self.inputs
            .iter()
            .zip(scaled)
            .map(|(s, &v)| s.denormalize(self.strategy, v))
            .collect()
    }

    pub fn normalize_output(&self, raw: &[f64; LABEL_COUNT]) -> [f64; LABEL_COUNT] {
        std::array::from_fn(|d| self.outputs[d].normalize(self.strategy, raw[d]))
    }

    /// Map a model prediction back to label units.
    pub fn denormalize_output(&self, scaled: &[f64; LABEL_COUNT]) -> [f64; LABEL_COUNT] {
        std::array::from_fn(|d| self.outputs[d].denormalize(self.strategy, scaled[d]))
    }
}

// ─── NormalizedDataset ────────────────────────────────────────────────────────
/// A ProcessedDataset after rescaling, plus the statistics used.
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    inputs:   Vec<Vec<f64>>,
    outputs:  Vec<[f64; LABEL_COUNT]>,
    metadata: DatasetMetadata,
    stats:    Arc<NormalizationStats>,
}

impl NormalizedDataset {
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[[f64; LABEL_COUNT]] {
        &self.outputs
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn stats(&self) -> &Arc<NormalizationStats> {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// New dataset holding the listed rows, in the listed order.
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            inputs:   rows.iter().map(|&r| self.inputs[r].clone()).collect(),
            outputs:  rows.iter().map(|&r| self.outputs[r]).collect(),
            metadata: self.metadata.clone(),
            stats:    Arc::clone(&self.stats),
        }
    }
}

// ─── Normalizer ───────────────────────────────────────────────────────────────
pub struct Normalizer {
    strategy: NormalizationStrategy,
}

impl Normalizer {
    pub fn new(strategy: NormalizationStrategy) -> Self {
        Self { strategy }
    }

    /// Fit on every row and rescale.
    pub fn normalize(&self, data: &ProcessedDataset) -> Result<NormalizedDataset> {
        let all: Vec<usize> = (0..data.len()).collect();
        self.normalize_with_pool(data, &all)
    }

    /// Fit on the rows in `pool` and rescale every row with those stats.
    pub fn normalize_with_pool(
        &self,
        data: &ProcessedDataset,
        pool: &[usize],
    ) -> Result<NormalizedDataset> {
        let stats = NormalizationStats::fit(data, pool, self.strategy)?;

        let constant_outputs = stats.outputs.iter().filter(|s| s.is_constant()).count();
        if constant_outputs > 0 {
            tracing::warn!("{constant_outputs} output dimension(s) are constant over the fitted rows");
        }
        tracing::debug!(
            "{} of {} input dimensions are constant",
            stats.inputs.iter().filter(|s| s.is_constant()).count(),
            stats.inputs.len()
        );

        let normalized = Self::apply(data, Arc::new(stats));
        tracing::info!(
            "Normalized {} rows with {} statistics fitted on {} rows",
            normalized.len(),
            self.strategy,
            pool.len()
        );
        Ok(normalized)
    }

    /// Rescale with statistics fitted elsewhere.
    pub fn apply(data: &ProcessedDataset, stats: Arc<NormalizationStats>) -> NormalizedDataset {
        NormalizedDataset {
            inputs:   data.inputs().iter().map(|v| stats.normalize_input(v)).collect(),
            outputs:  data.outputs().iter().map(|v| stats.normalize_output(v)).collect(),
            metadata: data.metadata().clone(),
            stats,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::FeaturePreprocessor;
    use crate::domain::example::{Labels, RawExample};

    fn dataset() -> ProcessedDataset {
        let rows = [(2, 5, 0.2, 1.0), (4, 5, 0.5, 3.0), (9, 5, 0.8, 10.0), (6, 5, 0.9, 0.0)];
        let examples: Vec<RawExample> = rows
            .iter()
            .map(|&(skills, required, score, weeks)| {
                RawExample::new(
                    skills,
                    required,
                    Labels {
                        readiness_score: score,
                        missing_skills:  5.0,
                        matched_skills:  f64::from(skills),
                        weeks_to_learn:  weeks,
                    },
                )
            })
            .collect();
        FeaturePreprocessor::new(1).process(&examples).unwrap()
    }

    #[test]
    fn test_min_max_round_trip() {
        let data = dataset();
        let norm = Normalizer::new(NormalizationStrategy::MinMax).normalize(&data).unwrap();
        let stats = norm.stats();

        for (raw, scaled) in data.inputs().iter().zip(norm.inputs()) {
            assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));
            let back = stats.denormalize_input(scaled);
            for (a, b) in raw.iter().zip(&back) {
                assert!((a - b).abs() < 1e-9, "{a} vs {b}");
            }
        }
        for (raw, scaled) in data.outputs().iter().zip(norm.outputs()) {
            let back = stats.denormalize_output(scaled);
            for (a, b) in raw.iter().zip(&back) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_width_dimension_stays_constant() {
        let data = dataset();
        let norm = Normalizer::new(NormalizationStrategy::MinMax).normalize(&data).unwrap();
        let stats = norm.stats();

        // requiredSkillCount is 5 everywhere; so is the missingSkills label
        assert!(stats.inputs[5].is_constant());
        assert!(norm.inputs().iter().all(|v| v[5] == 0.0));
        assert!(norm.outputs().iter().all(|v| v[1] == 0.0));
        assert_eq!(stats.denormalize_output(&norm.outputs()[0])[1], 5.0);
    }

    #[test]
    fn test_constant_inexact_column_normalizes_to_zero() {
        let examples: Vec<RawExample> = (0..1000)
            .map(|i| {
                RawExample::new(i % 9, 4, Labels {
                    readiness_score: 0.7,
                    missing_skills:  f64::from(i % 3),
                    matched_skills:  f64::from(i % 9),
                    weeks_to_learn:  1.1,
                })
            })
            .collect();
        let data = FeaturePreprocessor::new(1).process(&examples).unwrap();

        for strategy in [NormalizationStrategy::ZScore, NormalizationStrategy::MinMax] {
            let norm = Normalizer::new(strategy).normalize(&data).unwrap();
            let stats = norm.stats();

            assert_eq!(stats.outputs[0].mean, 0.7);
            assert_eq!(stats.outputs[0].std, 0.0);
            for o in norm.outputs() {
                assert_eq!((o[0], o[3]), (0.0, 0.0), "{strategy:?}");
            }
            assert_eq!(stats.denormalize_output(&norm.outputs()[0])[0], 0.7);
        }
    }

    #[test]
    fn test_negligible_spread_uses_unit_scale() {
        let stats = DimensionStats { min: 0.7, max: 0.7 + 1e-16, mean: 0.7, std: 1e-16 };
        assert_eq!(stats.normalize(NormalizationStrategy::ZScore, 0.7), 0.0);
        assert_eq!(stats.denormalize(NormalizationStrategy::ZScore, 0.0), 0.7);
    }

    #[test]
    fn test_z_score_standardizes() {
        let data = dataset();
        let norm = Normalizer::new(NormalizationStrategy::ZScore).normalize(&data).unwrap();

        let scores: Vec<f64> = norm.outputs().iter().map(|o| o[0]).collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let var  = scores.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        assert!(mean.abs() < 1e-9);
        assert!((var - 1.0).abs() < 1e-9);

        // zero variance guard
        assert!(norm.outputs().iter().all(|o| o[1] == 0.0));
    }

    #[test]
    fn test_pool_limits_fitted_rows() {
        let data = dataset();
        let norm = Normalizer::new(NormalizationStrategy::MinMax)
            .normalize_with_pool(&data, &[0, 1])
            .unwrap();
        let stats = norm.stats();

        assert_eq!(stats.fitted_rows, 2);
        assert_eq!(stats.inputs[0].max, 4.0);
        // row 2 lies outside the fitted range and is not clipped
        assert!(norm.inputs()[2][0] > 1.0);
    }

    #[test]
    fn test_select_shares_stats() {
        let data = dataset();
        let norm = Normalizer::new(NormalizationStrategy::MinMax).normalize(&data).unwrap();
        let subset = norm.select(&[3, 1]);

        assert_eq!(subset.len(), 2);
        assert_eq!(subset.outputs()[0], norm.outputs()[3]);
        assert!(Arc::ptr_eq(subset.stats(), norm.stats()));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("z-score".parse::<NormalizationStrategy>().unwrap(), NormalizationStrategy::ZScore);
        assert_eq!("MinMax".parse::<NormalizationStrategy>().unwrap(), NormalizationStrategy::MinMax);
        assert_eq!("train-only".parse::<FitStatsOn>().unwrap(), FitStatsOn::TrainOnly);
        assert!("median".parse::<NormalizationStrategy>().is_err());
    }
}
