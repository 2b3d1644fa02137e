// ============================================================
// Layer 6: Artifact Store
// ============================================================
// Persists everything a finished run needs in order to be
// reproduced or served later:
//
//   <artifact_dir>/
//     model_best.mpk.gz          ← weights (Burn CompactRecorder)
//     checkpoint.json            ← which epoch those weights are from
//     normalization_stats.json   ← per-dimension scaling statistics
//     pipeline_config.json       ← the config the run used
//     metrics.csv                ← written by MetricsLogger
//
// The model can only be rebuilt from its weights when the
// architecture is known, so the config is always saved alongside.
// The stats file is what lets a caller turn model outputs back
// into label units.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::config::PipelineConfig;
use crate::data::normalizer::NormalizationStats;
use crate::ml::model::ReadinessModel;

const STATS_FILE: &str = "normalization_stats.json";
const CONFIG_FILE: &str = "pipeline_config.json";
const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Pointer to the saved weights and the epoch they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointInfo {
    pub tag:      String,
    pub epoch:    usize,
    pub val_loss: f64,
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) an artifact directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create artifact directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Save model weights as `model_{info.tag}` and record the pointer.
    pub fn save_model<B: Backend>(
        &self,
        model: &ReadinessModel<B>,
        info:  &CheckpointInfo,
    ) -> Result<()> {
        // recorder appends the extension
        let path = self.dir.join(format!("model_{}", info.tag));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        self.write_json(CHECKPOINT_FILE, info)?;
        tracing::debug!("Saved '{}' model from epoch {}", info.tag, info.epoch);
        Ok(())
    }

    /// Load the weights named by checkpoint.json into `model`.
    ///
    /// `model` must have been built from the same architecture
    /// config, otherwise the record will not fit.
    pub fn load_model<B: Backend>(
        &self,
        model:  ReadinessModel<B>,
        device: &B::Device,
    ) -> Result<(ReadinessModel<B>, CheckpointInfo)> {
        let info: CheckpointInfo = self.read_json(CHECKPOINT_FILE)?;
        let path = self.dir.join(format!("model_{}", info.tag));

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load model '{}'", path.display()))?;

        Ok((model.load_record(record), info))
    }

    pub fn save_stats(&self, stats: &NormalizationStats) -> Result<()> {
        self.write_json(STATS_FILE, stats)
    }

    pub fn load_stats(&self) -> Result<NormalizationStats> {
        self.read_json(STATS_FILE)
    }

    pub fn save_config(&self, cfg: &PipelineConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<PipelineConfig> {
        self.read_json(CONFIG_FILE)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}
