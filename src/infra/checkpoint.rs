// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// Only the best model is kept. Each time validation improves:
//   1. the new weights are written to best_epoch_{N}.mpk.gz
//   2. the previous best file is removed
//   3. best_record.json is rewritten to point at epoch N
//
// train_config.json is written once before training so the test
// pass can rebuild the exact architecture before loading weights.
// Any best record and weights from an earlier run of the same
// experiment are cleared first.
//
// File layout:
//   ckpt/
//     best_epoch_41.mpk.gz   ← weights of the best epoch so far
//     best_record.json       ← {"epoch": 41, "loss": 0.00013}
//     train_config.json      ← run configuration
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::record::BestRecord;
use crate::ml::model::CnnRecon;

/// Extension CompactRecorder appends to every record path
const RECORD_EXT: &str = "mpk.gz";

const BEST_RECORD: &str = "best_record.json";
const TRAIN_CONFIG: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Checkpoints live in `dir`, created if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the weights file for `epoch`, including the recorder extension.
    pub fn best_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("best_epoch_{epoch}.{RECORD_EXT}"))
    }

    /// Save `model` as the new best checkpoint described by `record`,
    /// replacing the previous best. Returns the written file.
    pub fn save_best<B: Backend>(&self, model: &CnnRecon<B>, record: &BestRecord) -> Result<PathBuf> {
        let epoch = record.epoch.context("best record has no epoch")?;
        let previous = self.best_record().ok().and_then(|r| r.epoch);

        let path = self.best_path(epoch);
        CompactRecorder::new()
            .record(model.clone().into_record(), strip_record_ext(&path))
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.dir.join(BEST_RECORD), serde_json::to_string_pretty(record)?)
            .with_context(|| format!("Failed to write {BEST_RECORD}"))?;

        if let Some(prev) = previous.filter(|&p| p != epoch) {
            let old = self.best_path(prev);
            if let Err(e) = fs::remove_file(&old) {
                tracing::warn!("Could not remove old checkpoint '{}': {}", old.display(), e);
            }
        }

        tracing::info!("Saved best checkpoint: epoch {}, loss {:.8}", epoch, record.loss);
        Ok(path)
    }

    /// Load weights into `model`, from `snapshot` if given,
    /// otherwise from the best checkpoint recorded in this directory.
    pub fn load_model<B: Backend>(
        &self,
        model:    CnnRecon<B>,
        snapshot: Option<&Path>,
        device:   &B::Device,
    ) -> Result<CnnRecon<B>> {
        let path = match snapshot {
            Some(p) => p.to_path_buf(),
            None => {
                let epoch = self.best_record()?.epoch
                    .context("best_record.json has no epoch. Did validation ever run?")?;
                self.best_path(epoch)
            }
        };

        tracing::info!("Loading checkpoint '{}'", path.display());
        let record = CompactRecorder::new()
            .load(strip_record_ext(&path), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    /// Read best_record.json.
    pub fn best_record(&self) -> Result<BestRecord> {
        let path = self.dir.join(BEST_RECORD);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str(&s)?)
    }

    /// Remove best_record.json and every best_epoch_* weights file.
    pub fn clear_best(&self) -> Result<()> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list checkpoint dir '{}'", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let name  = entry.file_name();
            let name  = name.to_string_lossy();
            if name == BEST_RECORD || (name.starts_with("best_epoch_") && name.ends_with(RECORD_EXT)) {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Cannot remove stale '{}'", entry.path().display()))?;
                tracing::info!("Removed previous run's '{}'", name);
            }
        }
        Ok(())
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(TRAIN_CONFIG);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(TRAIN_CONFIG);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'test'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// CompactRecorder sets its own extension on the path it is given, so
/// `best_epoch_3.mpk.gz` has to be passed as `best_epoch_3`.
fn strip_record_ext(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_suffix(&format!(".{RECORD_EXT}")) {
        Some(stem) => PathBuf::from(stem),
        None       => path.to_path_buf(),
    }
}
