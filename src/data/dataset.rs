use burn::data::dataset::Dataset;

use crate::data::normalizer::NormalizedDataset;
use crate::domain::example::LABEL_COUNT;

/// One normalized row, converted to f32 for the tensor backend.
#[derive(Debug, Clone)]
pub struct ReadinessSample {
    pub input:  Vec<f32>,
    pub target: [f32; LABEL_COUNT],
}

pub struct ReadinessDataset {
    samples: Vec<ReadinessSample>,
}

impl ReadinessDataset {
    pub fn new(samples: Vec<ReadinessSample>) -> Self { Self { samples } }

    pub fn from_normalized(data: &NormalizedDataset) -> Self {
        let samples = data
            .inputs()
            .iter()
            .zip(data.outputs())
            .map(|(input, target)| ReadinessSample {
                input:  input.iter().map(|&v| v as f32).collect(),
                target: target.map(|v| v as f32),
            })
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[ReadinessSample] { &self.samples }
}

impl Dataset<ReadinessSample> for ReadinessDataset {
    fn get(&self, index: usize) -> Option<ReadinessSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
