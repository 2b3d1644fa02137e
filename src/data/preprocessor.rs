// ============================================================
// Layer 4: Feature Preprocessor
// ============================================================
// Turns each RawExample into one fixed-length input vector and
// one 4-element label vector.
//
// Input layout (positions never change between runs, because a
// trained model is only valid for the layout it was trained on):
//
//   [0..5)         resume scalars  (skillCount, yearsOfExperience,
//                                   educationLevel, seniority,
//                                   projectsCount)
//   [5..10)        job scalars     (requiredSkillCount,
//                                   requiredExperienceYears,
//                                   educationRequired, seniority,
//                                   employmentTypeScore)
//   [10..10+K)     resume skill vector, truncated / zero-padded to K
//   [10+K..10+2K)  job skill vector,    truncated / zero-padded to K
//
// An absent optional field encodes as 0.0. Labels are copied
// verbatim in LABEL_NAMES order.

use serde::{Deserialize, Serialize};

use crate::domain::example::{RawExample, LABEL_COUNT, LABEL_NAMES};
use crate::error::{PipelineError, Result};

/// Skill-vector width used by the original training data.
pub const DEFAULT_SKILL_VECTOR_LEN: usize = 40;

/// Encoded value for an absent optional field.
const MISSING: f64 = 0.0;

/// Names of the scalar features, in vector order.
pub const SCALAR_FEATURES: [&str; 10] = [
    "resume.skillCount",
    "resume.yearsOfExperience",
    "resume.educationLevel",
    "resume.seniority",
    "resume.projectsCount",
    "job.requiredSkillCount",
    "job.requiredExperienceYears",
    "job.educationRequired",
    "job.seniority",
    "job.employmentTypeScore",
];

/// Shape and ordering information shared by every dataset derived
/// from one preprocessing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub input_dimensions:  usize,
    pub output_dimensions: usize,
    pub feature_order:     Vec<String>,
}

/// Encoded inputs and labels. `inputs[i]` and `outputs[i]` belong to
/// the i-th RawExample.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDataset {
    inputs:   Vec<Vec<f64>>,
    outputs:  Vec<[f64; LABEL_COUNT]>,
    metadata: DatasetMetadata,
}

impl ProcessedDataset {
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[[f64; LABEL_COUNT]] {
        &self.outputs
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }
}

pub struct FeaturePreprocessor {
    skill_vector_len: usize,
}

impl FeaturePreprocessor {
    pub fn new(skill_vector_len: usize) -> Self {
        Self { skill_vector_len }
    }

    pub fn input_dimensions(&self) -> usize {
        SCALAR_FEATURES.len() + 2 * self.skill_vector_len
    }

    /// Name of every input position, in vector order.
    pub fn feature_order(&self) -> Vec<String> {
        let skills = |prefix: &str| {
            (0..self.skill_vector_len)
                .map(move |i| format!("{prefix}.skillVector[{i}]"))
                .collect::<Vec<_>>()
        };

        SCALAR_FEATURES
            .iter()
            .map(|name| name.to_string())
            .chain(skills("resume"))
            .chain(skills("job"))
            .collect()
    }

    /// Encode every example. Fails on the first non-finite label or feature.
    pub fn process(&self, examples: &[RawExample]) -> Result<ProcessedDataset> {
        if examples.is_empty() {
            return Err(PipelineError::InsufficientData { rows: 0, required: 1 });
        }

        let mut inputs  = Vec::with_capacity(examples.len());
        let mut outputs = Vec::with_capacity(examples.len());

        for (index, example) in examples.iter().enumerate() {
            outputs.push(encode_labels(index, example)?);
            inputs.push(self.encode(index, example)?);
        }

        let metadata = DatasetMetadata {
            input_dimensions:  self.input_dimensions(),
            output_dimensions: LABEL_COUNT,
            feature_order:     self.feature_order(),
        };

        tracing::info!(
            "Preprocessed {} examples into {}-dimensional inputs",
            inputs.len(),
            metadata.input_dimensions
        );

        Ok(ProcessedDataset { inputs, outputs, metadata })
    }

    /// Encode one example's résumé and job features into an input vector.
    pub fn encode(&self, index: usize, example: &RawExample) -> Result<Vec<f64>> {
        let r = &example.resume_features;
        let j = &example.job_features;

        let scalars = [
            f64::from(r.skill_count),
            r.years_of_experience.unwrap_or(MISSING),
            r.education_level.unwrap_or(MISSING),
            r.seniority.unwrap_or(MISSING),
            r.projects_count.unwrap_or(MISSING),
            f64::from(j.required_skill_count),
            j.required_experience_years.unwrap_or(MISSING),
            j.education_required.unwrap_or(MISSING),
            j.seniority.unwrap_or(MISSING),
            j.employment_type_score.unwrap_or(MISSING),
        ];

        let mut vector = Vec::with_capacity(self.input_dimensions());
        for (name, value) in SCALAR_FEATURES.iter().zip(scalars) {
            if !value.is_finite() {
                return Err(PipelineError::InvalidFeature { index, field: name.to_string() });
            }
            vector.push(value);
        }

        self.push_skill_vector(index, "resume", r.skill_vector.as_deref(), &mut vector)?;
        self.push_skill_vector(index, "job", j.skill_vector.as_deref(), &mut vector)?;

        debug_assert_eq!(vector.len(), self.input_dimensions());
        Ok(vector)
    }

    fn push_skill_vector(
        &self,
        index:  usize,
        prefix: &str,
        skills: Option<&[f64]>,
        out:    &mut Vec<f64>,
    ) -> Result<()> {
        let skills = skills.unwrap_or(&[]);

        for position in 0..self.skill_vector_len {
            let value = skills.get(position).copied().unwrap_or(MISSING);
            if !value.is_finite() {
                return Err(PipelineError::InvalidFeature {
                    index,
                    field: format!("{prefix}.skillVector[{position}]"),
                });
            }
            out.push(value);
        }
        Ok(())
    }
}

impl Default for FeaturePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_SKILL_VECTOR_LEN)
    }
}

fn encode_labels(index: usize, example: &RawExample) -> Result<[f64; LABEL_COUNT]> {
    let labels = example.labels.to_array();
    for (label, value) in LABEL_NAMES.into_iter().zip(labels) {
        if !value.is_finite() {
            return Err(PipelineError::InvalidLabel { index, label, value });
        }
    }
    Ok(labels)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::Labels;

    fn labels(score: f64) -> Labels {
        Labels {
            readiness_score: score,
            missing_skills:  2.0,
            matched_skills:  5.0,
            weeks_to_learn:  12.0,
        }
    }

    fn rich_example() -> RawExample {
        let mut ex = RawExample::new(7, 9, labels(0.4));
        ex.resume_features.years_of_experience = Some(4.5);
        ex.resume_features.skill_vector = Some(vec![1.0, 0.0, 1.0, 1.0, 1.0]);
        ex.job_features.seniority = Some(0.75);
        ex.job_features.skill_vector = Some(vec![0.0, 1.0]);
        ex
    }

    #[test]
    fn test_lengths_and_label_order() {
        let p = FeaturePreprocessor::new(3);
        let examples = vec![rich_example(), RawExample::new(1, 2, labels(0.9))];
        let data = p.process(&examples).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.outputs().len(), 2);
        assert_eq!(data.metadata().input_dimensions, 16);
        assert_eq!(data.metadata().output_dimensions, 4);
        assert!(data.inputs().iter().all(|v| v.len() == 16));
        assert_eq!(data.outputs()[1], [0.9, 2.0, 5.0, 12.0]);
    }

    #[test]
    fn test_encoding_is_bit_identical() {
        let p = FeaturePreprocessor::default();
        let a = p.encode(0, &rich_example()).unwrap();
        let b = p.encode(0, &rich_example()).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_positions_follow_feature_order() {
        let p = FeaturePreprocessor::new(3);
        let v = p.encode(0, &rich_example()).unwrap();
        let order = p.feature_order();
        let at = |name: &str| v[order.iter().position(|n| n == name).unwrap()];

        assert_eq!(order.len(), v.len());
        assert_eq!(at("resume.skillCount"), 7.0);
        assert_eq!(at("resume.yearsOfExperience"), 4.5);
        assert_eq!(at("job.requiredSkillCount"), 9.0);
        assert_eq!(at("job.seniority"), 0.75);
        // resume vector truncated to 3, job vector padded to 3
        assert_eq!(at("resume.skillVector[2]"), 1.0);
        assert_eq!(at("job.skillVector[1]"), 1.0);
        assert_eq!(at("job.skillVector[2]"), 0.0);
    }

    #[test]
    fn test_missing_optionals_encode_as_zero() {
        let p = FeaturePreprocessor::new(2);
        let v = p.encode(0, &RawExample::new(3, 4, labels(0.5))).unwrap();
        assert_eq!(v, vec![3.0, 0.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nan_label_names_example_index() {
        let p = FeaturePreprocessor::default();
        let mut bad = RawExample::new(3, 4, labels(0.5));
        bad.labels.weeks_to_learn = f64::NAN;
        let examples = vec![rich_example(), rich_example(), bad, rich_example()];

        match p.process(&examples).unwrap_err() {
            PipelineError::InvalidLabel { index, label, .. } => {
                assert_eq!(index, 2);
                assert_eq!(label, "weeksToLearn");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_infinite_feature_rejected() {
        let p = FeaturePreprocessor::new(2);
        let mut bad = rich_example();
        bad.job_features.employment_type_score = Some(f64::INFINITY);
        assert!(matches!(
            p.process(&[bad]).unwrap_err(),
            PipelineError::InvalidFeature { index: 0, ref field } if field == "job.employmentTypeScore"
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let p = FeaturePreprocessor::default();
        assert!(matches!(
            p.process(&[]).unwrap_err(),
            PipelineError::InsufficientData { rows: 0, .. }
        ));
    }
}
