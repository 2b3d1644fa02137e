// ============================================================
// Layer 4: Example Loader
// ============================================================
// Loads the labelled dataset from a JSON file shaped like:
//
//   [
//     { "resumeFeatures": { "skillCount": 4, ... },
//       "jobFeatures":    { "requiredSkillCount": 6, ... },
//       "labels":         { "readinessScore": 0.6, ... } },
//     ...
//   ]
//
// Loading happens in two passes over each record:
//   1. Walk the raw serde_json::Value and check the required
//      sections, counts and labels, plus the type of any optional
//      feature that is present. This gives errors with the exact
//      record index and field path.
//   2. Deserialize the checked Value into a RawExample.
//
// The first problem found aborts the load. Nothing is skipped.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::domain::example::RawExample;
use crate::domain::traits::ExampleSource;
use crate::error::{PipelineError, Result};

/// Required label keys with the alternative spellings older files use.
const LABEL_FIELDS: [(&str, &[&str]); 4] = [
    ("readinessScore", &[]),
    ("missingSkills",  &["missingSkillCount"]),
    ("matchedSkills",  &["matchedSkillCount"]),
    ("weeksToLearn",   &["estimatedWeeksToLearn"]),
];

/// Optional feature keys and the JSON shape each must have when present.
const OPTIONAL_FIELDS: [(&str, &str, Shape); 12] = [
    ("resumeFeatures", "yearsOfExperience",       Shape::Number),
    ("resumeFeatures", "educationLevel",          Shape::Number),
    ("resumeFeatures", "seniority",               Shape::Number),
    ("resumeFeatures", "projectsCount",           Shape::Number),
    ("resumeFeatures", "skillVector",             Shape::Numbers),
    ("resumeFeatures", "jobTitles",               Shape::Strings),
    ("jobFeatures",    "requiredExperienceYears", Shape::Number),
    ("jobFeatures",    "educationRequired",       Shape::Number),
    ("jobFeatures",    "seniority",               Shape::Number),
    ("jobFeatures",    "employmentTypeScore",     Shape::Number),
    ("jobFeatures",    "skillVector",             Shape::Numbers),
    ("jobFeatures",    "jobTitle",                Shape::String),
];

#[derive(Debug, Clone, Copy)]
enum Shape {
    Number,
    String,
    Numbers,
    Strings,
}

/// Reads a JSON array of examples from disk.
/// Implements the ExampleSource trait from Layer 3.
pub struct JsonExampleLoader {
    path: PathBuf,
}

impl JsonExampleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for JsonExampleLoader {
    fn load_all(&self) -> Result<Vec<RawExample>> {
        let text = fs::read_to_string(&self.path).map_err(|e| PipelineError::DataLoad {
            path:   self.path.clone(),
            reason: e.to_string(),
        })?;

        let examples = parse_examples(&text, &self.path)?;
        tracing::info!(
            "Loaded {} examples from '{}'",
            examples.len(),
            self.path.display()
        );
        Ok(examples)
    }
}

/// Parse and validate a JSON document holding an array of examples.
/// `origin` only labels error messages.
pub fn parse_examples(text: &str, origin: &Path) -> Result<Vec<RawExample>> {
    let root: Value = serde_json::from_str(text).map_err(|e| PipelineError::DataLoad {
        path:   origin.to_path_buf(),
        reason: format!("invalid JSON: {e}"),
    })?;

    let records = match root {
        Value::Array(records) => records,
        other => {
            return Err(PipelineError::DataLoad {
                path:   origin.to_path_buf(),
                reason: format!("expected an array of examples, found {}", json_kind(&other)),
            })
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            validate_record(index, &mut record)?;
            serde_json::from_value::<RawExample>(record).map_err(|e| schema(index, "<record>", e.to_string()))
        })
        .collect()
}

/// Check required structure and coerce integral counts so the typed
/// deserialization that follows cannot fail on them.
fn validate_record(index: usize, record: &mut Value) -> Result<()> {
    if !record.is_object() {
        return Err(schema(
            index,
            "<record>",
            format!("expected an object, found {}", json_kind(record)),
        ));
    }

    for section in ["resumeFeatures", "jobFeatures", "labels"] {
        match record.get(section) {
            Some(Value::Object(_)) => {}
            None | Some(Value::Null) => return Err(schema(index, section, "field is missing")),
            Some(other) => {
                return Err(schema(
                    index,
                    section,
                    format!("expected an object, found {}", json_kind(other)),
                ))
            }
        }
    }

    coerce_count(index, record, "resumeFeatures", "skillCount")?;
    coerce_count(index, record, "jobFeatures", "requiredSkillCount")?;

    for (section, field, shape) in OPTIONAL_FIELDS {
        match record[section].get(field) {
            None | Some(Value::Null) => {}
            Some(value) => check_shape(index, &format!("{section}.{field}"), value, shape)?,
        }
    }

    let labels = &record["labels"];
    for (name, aliases) in LABEL_FIELDS {
        let value = std::iter::once(name)
            .chain(aliases.iter().copied())
            .find_map(|key| labels.get(key).filter(|v| !v.is_null()));

        match value {
            Some(Value::Number(_)) => {}
            None => return Err(schema(index, format!("labels.{name}"), "field is missing")),
            Some(other) => {
                return Err(schema(
                    index,
                    format!("labels.{name}"),
                    format!("expected a number, found {}", json_kind(other)),
                ))
            }
        }
    }

    Ok(())
}

/// Skill counts must be non-negative integers. Integral floats such as
/// `3.0` are accepted and rewritten as integers.
fn coerce_count(index: usize, record: &mut Value, section: &str, field: &str) -> Result<()> {
    let path = format!("{section}.{field}");
    let slot = match record.get_mut(section).and_then(|s| s.get_mut(field)) {
        Some(slot) if !slot.is_null() => slot,
        _ => return Err(schema(index, path, "field is missing")),
    };

    let n = slot
        .as_f64()
        .ok_or_else(|| schema(index, path.clone(), format!("expected a number, found {}", json_kind(slot))))?;

    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return Err(schema(
            index,
            path,
            format!("expected a non-negative integer, found {n}"),
        ));
    }

    *slot = Value::from(n as u64);
    Ok(())
}

/// Optional fields may be absent or null; otherwise they must match `shape`.
fn check_shape(index: usize, path: &str, value: &Value, shape: Shape) -> Result<()> {
    let mismatch = |field: String, want: &str, found: &Value| {
        schema(index, field, format!("expected {want}, found {}", json_kind(found)))
    };

    let (want, item_ok): (&str, fn(&Value) -> bool) = match shape {
        Shape::Number | Shape::Numbers => ("a number", Value::is_number),
        Shape::String | Shape::Strings => ("a string", Value::is_string),
    };

    match (shape, value) {
        (Shape::Number | Shape::String, _) if item_ok(value) => Ok(()),
        (Shape::Number | Shape::String, _) => Err(mismatch(path.to_string(), want, value)),
        (Shape::Numbers | Shape::Strings, Value::Array(items)) => {
            match items.iter().position(|item| !item_ok(item)) {
                None => Ok(()),
                Some(i) => Err(mismatch(format!("{path}[{i}]"), want, &items[i])),
            }
        }
        (Shape::Numbers | Shape::Strings, _) => Err(mismatch(path.to_string(), "an array", value)),
    }
}

fn schema(index: usize, field: impl Into<String>, reason: impl Into<String>) -> PipelineError {
    PipelineError::Schema {
        index,
        field:  field.into(),
        reason: reason.into(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}
