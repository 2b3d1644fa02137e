// ============================================================
// Layer 2: StatsUseCase
// ============================================================
// Dataset inspection without training: load → preprocess →
// normalize, then summarize each of the four outputs.
//
// Summaries are reported twice: in label units (as the labels
// were written in the dataset) and after normalization. Stats are
// fitted on every row here since no split is drawn.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::config::PipelineConfig;
use crate::data::{
    loader::JsonExampleLoader,
    normalizer::{NormalizationStats, Normalizer},
    preprocessor::FeaturePreprocessor,
};
use crate::domain::{
    example::{LABEL_COUNT, LABEL_NAMES},
    traits::ExampleSource,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSummary {
    pub name:  String,
    pub min:   f64,
    pub max:   f64,
    pub mean:  f64,
    pub count: usize,
}

impl OutputSummary {
    fn from_rows(name: &str, dim: usize, rows: &[[f64; LABEL_COUNT]]) -> Self {
        let (min, max, sum) = rows.iter().map(|r| r[dim]).fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), v| (lo.min(v), hi.max(v), sum + v),
        );
        Self {
            name: name.to_string(),
            min,
            max,
            mean: sum / rows.len() as f64,
            count: rows.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total_examples:     usize,
    pub input_dimensions:   usize,
    pub output_dimensions:  usize,
    pub feature_order:      Vec<String>,
    /// Label units
    pub outputs:            Vec<OutputSummary>,
    pub normalized_outputs: Vec<OutputSummary>,
    pub normalization:      NormalizationStats,
}

pub struct StatsUseCase {
    config: PipelineConfig,
    source: Box<dyn ExampleSource>,
}

impl StatsUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        let source = JsonExampleLoader::new(config.dataset_path.clone());
        Self::with_source(config, source)
    }

    pub fn with_source(config: PipelineConfig, source: impl ExampleSource + 'static) -> Self {
        Self { config, source: Box::new(source) }
    }

    pub fn execute(&self) -> Result<StatsReport> {
        let cfg = &self.config;
        cfg.validate()?;

        let examples = self.source.load_all()?;
        let processed = FeaturePreprocessor::new(cfg.skill_vector_len).process(&examples)?;
        let normalized = Normalizer::new(cfg.normalization).normalize(&processed)?;

        let summarize = |rows: &[[f64; LABEL_COUNT]]| -> Vec<OutputSummary> {
            LABEL_NAMES
                .into_iter()
                .enumerate()
                .map(|(d, name)| OutputSummary::from_rows(name, d, rows))
                .collect()
        };

        let metadata = processed.metadata();
        let report = StatsReport {
            total_examples:     processed.len(),
            input_dimensions:   metadata.input_dimensions,
            output_dimensions:  metadata.output_dimensions,
            feature_order:      metadata.feature_order.clone(),
            outputs:            summarize(processed.outputs()),
            normalized_outputs: summarize(normalized.outputs()),
            normalization:      normalized.stats().as_ref().clone(),
        };

        for s in &report.outputs {
            tracing::info!(
                "{:<15} min={:.4} max={:.4} mean={:.4} (n={})",
                s.name, s.min, s.max, s.mean, s.count
            );
        }
        Ok(report)
    }
}

/// Load, preprocess and normalize, then summarize without training.
pub fn run_statistics(config: PipelineConfig) -> Result<StatsReport> {
    let dataset = config.dataset_path.clone();
    StatsUseCase::new(config)
        .execute()
        .with_context(|| format!("Statistics failed for '{}'", dataset.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalizer::NormalizationStrategy;
    use crate::domain::example::{Labels, RawExample};
    use crate::error::PipelineError;

    fn rows() -> Vec<RawExample> {
        (0..6u32)
            .map(|i| {
                RawExample::new(i, 4, Labels {
                    readiness_score: 5.0,
                    missing_skills:  f64::from(i),
                    matched_skills:  f64::from(6 - i),
                    weeks_to_learn:  2.0 * f64::from(i),
                })
            })
            .collect()
    }

    #[test]
    fn test_constant_label_summary() {
        let cfg = PipelineConfig { skill_vector_len: 2, ..Default::default() };
        let report = StatsUseCase::with_source(cfg, rows()).execute().unwrap();

        let score = &report.outputs[0];
        assert_eq!(score.name, "readinessScore");
        assert_eq!((score.min, score.max, score.mean), (5.0, 5.0, 5.0));
        assert_eq!(score.count, 6);

        // constant dimension normalizes to a single value
        let normalized = &report.normalized_outputs[0];
        assert_eq!(normalized.min, normalized.max);
        assert!(normalized.mean.is_finite());
    }

    #[test]
    fn test_report_shape() {
        let cfg = PipelineConfig {
            skill_vector_len: 2,
            normalization: NormalizationStrategy::MinMax,
            ..Default::default()
        };
        let report = StatsUseCase::with_source(cfg, rows()).execute().unwrap();

        assert_eq!(report.total_examples, 6);
        assert_eq!(report.input_dimensions, 14);
        assert_eq!(report.output_dimensions, 4);
        assert_eq!(report.feature_order.len(), 14);
        assert_eq!(report.outputs[3].max, 10.0);
        assert_eq!(report.normalized_outputs[3].max, 1.0);
        assert_eq!(report.normalized_outputs[3].min, 0.0);
        assert_eq!(report.normalization.fitted_rows, 6);
    }

    #[test]
    fn test_empty_dataset_is_insufficient() {
        let err = StatsUseCase::with_source(PipelineConfig::default(), Vec::<RawExample>::new())
            .execute()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InsufficientData { .. })
        ));
    }
}
