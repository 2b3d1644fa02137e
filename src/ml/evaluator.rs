// ============================================================
// Layer 5: Evaluation
// ============================================================
// Scores a model on a normalized split without touching its
// weights. Runs on the inner (non-autodiff) backend so no
// gradient graph is built.
//
//   split_loss  → (MSE, MAE) over every row and all 4 outputs
//   evaluate    → TestMetrics plus per-output mse/rmse/mae/r2

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::batcher::ReadinessBatch;
use crate::data::normalizer::NormalizedDataset;
use crate::domain::example::{LABEL_COUNT, LABEL_NAMES};
use crate::error::{PipelineError, Result};
use crate::ml::model::ReadinessModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetrics {
    pub test_loss: f64,
    pub test_mae:  f64,
}

/// Metrics for one of the four outputs, in normalized units unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetrics {
    pub name: String,
    pub mse:  f64,
    pub rmse: f64,
    pub mae:  f64,
    /// 0.0 when the targets are constant on the split
    pub r2:   f64,
    /// MAE after mapping predictions and targets back to label units
    pub mae_label_units: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub metrics:    TestMetrics,
    pub per_output: Vec<OutputMetrics>,
}

/// Mean squared and mean absolute error of `model` on `batch`.
pub fn split_loss<B: Backend>(model: &ReadinessModel<B>, batch: &ReadinessBatch<B>) -> (f64, f64) {
    let (loss, output) = model.forward_loss(batch.inputs.clone(), batch.targets.clone());
    let mae = (output - batch.targets.clone())
        .abs()
        .mean()
        .into_scalar()
        .elem::<f64>();
    (loss.into_scalar().elem::<f64>(), mae)
}

/// Single pass over the test split.
pub fn evaluate<B: Backend>(
    model:  &ReadinessModel<B>,
    test:   &NormalizedDataset,
    device: &B::Device,
) -> Result<Evaluation> {
    if test.is_empty() {
        return Err(PipelineError::EmptySplit { split: "test" });
    }

    let batch = ReadinessBatch::<B>::from_dataset(test, device);
    let (test_loss, test_mae) = split_loss(model, &batch);

    let flat: Vec<f64> = model
        .forward(batch.inputs)
        .into_data()
        .iter::<f32>()
        .map(f64::from)
        .collect();
    let predictions: Vec<[f64; LABEL_COUNT]> = flat
        .chunks_exact(LABEL_COUNT)
        .map(|row| std::array::from_fn(|d| row[d]))
        .collect();

    let per_output = LABEL_NAMES
        .into_iter()
        .enumerate()
        .map(|(d, name)| output_metrics(name, d, &predictions, test))
        .collect();

    Ok(Evaluation {
        metrics: TestMetrics { test_loss, test_mae },
        per_output,
    })
}

fn output_metrics(
    name:        &str,
    dim:         usize,
    predictions: &[[f64; LABEL_COUNT]],
    test:        &NormalizedDataset,
) -> OutputMetrics {
    let n = predictions.len() as f64;
    let targets = test.outputs();

    let mut sq = 0.0;
    let mut abs = 0.0;
    let mut abs_label = 0.0;
    for (pred, target) in predictions.iter().zip(targets) {
        let err = pred[dim] - target[dim];
        sq += err * err;
        abs += err.abs();
        abs_label += (test.stats().denormalize_output(pred)[dim]
            - test.stats().denormalize_output(target)[dim])
            .abs();
    }

    let mean = targets.iter().map(|t| t[dim]).sum::<f64>() / n;
    let ss_tot: f64 = targets.iter().map(|t| (t[dim] - mean).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - sq / ss_tot } else { 0.0 };

    let mse = sq / n;
    OutputMetrics {
        name: name.to_string(),
        mse,
        rmse: mse.sqrt(),
        mae: abs / n,
        r2,
        mae_label_units: abs_label / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::normalizer::{NormalizationStrategy, Normalizer};
    use crate::data::preprocessor::FeaturePreprocessor;
    use crate::domain::example::{Labels, RawExample};
    use crate::ml::model::ReadinessModelConfig;

    fn normalized(rows: u32) -> NormalizedDataset {
        let examples: Vec<RawExample> = (0..rows)
            .map(|i| {
                RawExample::new(i + 1, 10 - i, Labels {
                    readiness_score: 0.1 * f64::from(i),
                    missing_skills:  f64::from(10 - i),
                    matched_skills:  f64::from(i),
                    weeks_to_learn:  3.0,
                })
            })
            .collect();
        let processed = FeaturePreprocessor::new(3).process(&examples).unwrap();
        Normalizer::new(NormalizationStrategy::MinMax)
            .normalize(&processed)
            .unwrap()
    }

    #[test]
    fn test_per_output_metrics_agree_with_totals() {
        let device = Default::default();
        let data = normalized(6);
        let model: ReadinessModel<NdArray> =
            ReadinessModelConfig::new(data.metadata().input_dimensions, vec![8])
                .with_dropout(0.0)
                .init(&device);

        let eval = evaluate(&model, &data, &device).unwrap();
        assert_eq!(eval.per_output.len(), LABEL_COUNT);
        assert_eq!(eval.per_output[0].name, "readinessScore");

        let mean_mse = eval.per_output.iter().map(|m| m.mse).sum::<f64>() / LABEL_COUNT as f64;
        assert!((mean_mse - eval.metrics.test_loss).abs() < 1e-4);

        for m in &eval.per_output {
            assert!((m.rmse - m.mse.sqrt()).abs() < 1e-12);
            assert!(m.r2.is_finite() && m.mae_label_units.is_finite());
        }
        // weeksToLearn is constant in the fixture
        assert_eq!(eval.per_output[3].r2, 0.0);
    }

    #[test]
    fn test_empty_test_split_rejected() {
        let device = Default::default();
        let data = normalized(3).select(&[]);
        let model: ReadinessModel<NdArray> =
            ReadinessModelConfig::new(data.metadata().input_dimensions, vec![4]).init(&device);

        let err = evaluate(&model, &data, &device).unwrap_err();
        assert!(matches!(err, PipelineError::EmptySplit { split: "test" }));
    }
}
