// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one row per epoch to metrics.csv:
//
//   epoch,train_loss,val_loss,lr
//   0,0.081234,0.079120,0.001000
//   1,0.051002,,0.000980        ← no validation this epoch
//
// The per-step curves go to TensorBoard event files instead
// (see ml/trainer.rs); this CSV is the per-epoch summary.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 0)
    pub epoch: usize,

    /// Sample-weighted L1 loss over the training set
    pub train_loss: f64,

    /// Sample-weighted L1 loss over the validation set,
    /// None on epochs that skip validation
    pub val_loss: Option<f64>,

    /// Learning rate used during this epoch
    pub lr: f64,
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,val_loss,lr")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        let val = m.val_loss.map(|v| format!("{v:.6}")).unwrap_or_default();
        writeln!(f, "{},{:.6},{},{:.6}", m.epoch, m.train_loss, val, m.lr)?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_rows_with_and_without_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let log = MetricsLogger::new(tmp.path()).unwrap();
        log.log(&EpochMetrics { epoch: 0, train_loss: 0.5, val_loss: Some(0.25), lr: 1e-3 }).unwrap();
        log.log(&EpochMetrics { epoch: 1, train_loss: 0.4, val_loss: None, lr: 9.8e-4 }).unwrap();

        let text = fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows, vec![
            "epoch,train_loss,val_loss,lr",
            "0,0.500000,0.250000,0.001000",
            "1,0.400000,,0.000980",
        ]);
    }
}
