// ============================================================
// Layer 4: Readiness Batcher
// ============================================================
// Implements Burn's Batcher trait to stack ReadinessSamples into
// tensors for the model forward pass.
//
//   Input:  Vec of N samples, each with D features and 4 targets
//   Output: ReadinessBatch with inputs [N, D] and targets [N, 4]
//
// Every sample has the same D (fixed by the preprocessor), so
// stacking is a flatten followed by a reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::{ReadinessDataset, ReadinessSample};
use crate::data::normalizer::NormalizedDataset;
use crate::domain::example::LABEL_COUNT;

// ─── ReadinessBatch ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ReadinessBatch<B: Backend> {
    /// Normalized features, shape: [batch_size, input_dim]
    pub inputs: Tensor<B, 2>,

    /// Normalized labels, shape: [batch_size, 4]
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> ReadinessBatch<B> {
    pub fn from_samples(items: &[ReadinessSample], device: &B::Device) -> Self {
        let rows = items.len();
        let dims = items.first().map_or(0, |s| s.input.len());

        let inputs: Vec<f32> = items.iter().flat_map(|s| s.input.iter().copied()).collect();
        let targets: Vec<f32> = items.iter().flat_map(|s| s.target).collect();

        let inputs  = Tensor::<B, 2>::from_data(TensorData::new(inputs, [rows, dims]), device);
        let targets = Tensor::<B, 2>::from_data(TensorData::new(targets, [rows, LABEL_COUNT]), device);

        Self { inputs, targets }
    }

    /// Whole dataset as a single batch, for evaluation passes.
    pub fn from_dataset(data: &NormalizedDataset, device: &B::Device) -> Self {
        Self::from_samples(ReadinessDataset::from_normalized(data).samples(), device)
    }
}

// ─── ReadinessBatcher ─────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct ReadinessBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ReadinessBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ReadinessSample, ReadinessBatch<B>> for ReadinessBatcher<B> {
    fn batch(&self, items: Vec<ReadinessSample>) -> ReadinessBatch<B> {
        ReadinessBatch::from_samples(&items, &self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device = Default::default();
        let batcher = ReadinessBatcher::<NdArray>::new(device);
        let items = vec![
            ReadinessSample { input: vec![0.0, 0.5, 1.0], target: [0.1, 0.2, 0.3, 0.4] },
            ReadinessSample { input: vec![1.0, 0.5, 0.0], target: [0.5, 0.6, 0.7, 0.8] },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.inputs.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 4]);

        let targets: Vec<f32> = batch.targets.into_data().iter::<f32>().collect();
        assert_eq!(targets[4], 0.5);
        assert_eq!(targets[7], 0.8);
    }
}
