// ============================================================
// Layer 3: RawExample Domain Type
// ============================================================
// One labelled résumé/job-posting pair exactly as it appears in
// the persisted dataset. The JSON uses camelCase keys, and the
// label block accepts both the short names and the longer names
// found in older dataset files:
//
//   missingSkills  ← missingSkillCount
//   matchedSkills  ← matchedSkillCount
//   weeksToLearn   ← estimatedWeeksToLearn
//
// Only skillCount / requiredSkillCount and the four labels are
// required. Every other numeric field is optional; the feature
// preprocessor encodes an absent field as 0.0.

use serde::{Deserialize, Serialize};

/// Number of regression targets predicted by the model.
pub const LABEL_COUNT: usize = 4;

/// Output vector order. Position `i` of every output vector holds
/// the label named `LABEL_NAMES[i]`.
pub const LABEL_NAMES: [&str; LABEL_COUNT] =
    ["readinessScore", "missingSkills", "matchedSkills", "weeksToLearn"];

/// Résumé-derived counts and fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFeatures {
    pub skill_count: u32,

    #[serde(default)]
    pub years_of_experience: Option<f64>,

    /// 0 = high school, 1 = bachelor, 2 = master, 3 = PhD
    #[serde(default)]
    pub education_level: Option<f64>,

    #[serde(default)]
    pub seniority: Option<f64>,

    #[serde(default)]
    pub projects_count: Option<f64>,

    /// Multi-hot encoding over the skill vocabulary
    #[serde(default)]
    pub skill_vector: Option<Vec<f64>>,

    /// Carried for traceability, never encoded
    #[serde(default)]
    pub job_titles: Option<Vec<String>>,
}

/// Job-posting-derived counts and fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFeatures {
    pub required_skill_count: u32,

    #[serde(default)]
    pub required_experience_years: Option<f64>,

    #[serde(default)]
    pub education_required: Option<f64>,

    #[serde(default)]
    pub seniority: Option<f64>,

    #[serde(default)]
    pub employment_type_score: Option<f64>,

    #[serde(default)]
    pub skill_vector: Option<Vec<f64>>,

    #[serde(default)]
    pub job_title: Option<String>,
}

/// The four regression targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Labels {
    pub readiness_score: f64,

    #[serde(alias = "missingSkillCount")]
    pub missing_skills: f64,

    #[serde(alias = "matchedSkillCount")]
    pub matched_skills: f64,

    #[serde(alias = "estimatedWeeksToLearn")]
    pub weeks_to_learn: f64,
}

impl Labels {
    /// Labels in `LABEL_NAMES` order.
    pub fn to_array(&self) -> [f64; LABEL_COUNT] {
        [
            self.readiness_score,
            self.missing_skills,
            self.matched_skills,
            self.weeks_to_learn,
        ]
    }
}

/// A single labelled example. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExample {
    pub resume_features: ResumeFeatures,
    pub job_features:    JobFeatures,
    pub labels:          Labels,
}

impl RawExample {
    /// Build an example with only the required fields populated.
    pub fn new(skill_count: u32, required_skill_count: u32, labels: Labels) -> Self {
        Self {
            resume_features: ResumeFeatures {
                skill_count,
                years_of_experience: None,
                education_level:     None,
                seniority:           None,
                projects_count:      None,
                skill_vector:        None,
                job_titles:          None,
            },
            job_features: JobFeatures {
                required_skill_count,
                required_experience_years: None,
                education_required:        None,
                seniority:                 None,
                employment_type_score:     None,
                skill_vector:              None,
                job_title:                 None,
            },
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_long_label_names() {
        let json = r#"{
            "resumeFeatures": { "skillCount": 4, "yearsOfExperience": 3 },
            "jobFeatures":    { "requiredSkillCount": 6 },
            "labels": {
                "readinessScore": 0.6,
                "missingSkillCount": 2,
                "matchedSkillCount": 4,
                "estimatedWeeksToLearn": 8
            }
        }"#;
        let ex: RawExample = serde_json::from_str(json).unwrap();
        assert_eq!(ex.labels.to_array(), [0.6, 2.0, 4.0, 8.0]);
        assert_eq!(ex.resume_features.years_of_experience, Some(3.0));
        assert_eq!(ex.job_features.seniority, None);
    }

    #[test]
    fn test_label_order_matches_names() {
        let labels = Labels {
            readiness_score: 1.0,
            missing_skills:  2.0,
            matched_skills:  3.0,
            weeks_to_learn:  4.0,
        };
        assert_eq!(LABEL_NAMES[3], "weeksToLearn");
        assert_eq!(labels.to_array()[3], 4.0);
    }
}
