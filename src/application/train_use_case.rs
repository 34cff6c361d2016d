// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration     (this layer)
//   Step 2: Prepare the experiment dirs    (Layer 6 - infra)
//   Step 3: Open the snapshot source       (Layer 4 - data)
//   Step 4: Check data against the model   (this layer)
//   Step 5: Build noisy sensor datasets    (Layer 4 - data)
//   Step 6: Save config for the test pass  (Layer 6 - infra)
//   Step 7: Run the training loop          (Layer 5 - ml)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{
    dataset::{CylinderSnrDataset, NoiseMode},
    open_source,
};
use crate::domain::{range::IndexRange, sensor::SensorLayout, traits::FieldSource};
use crate::infra::{checkpoint::CheckpointManager, experiment::Experiment};
use crate::ml::{
    backend::{cpu_device, wgpu_device, CpuBackend, GpuBackend},
    model::CnnReconConfig,
    trainer::{run_training, TrainSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Serialisable so it can be
// saved next to the checkpoint and reloaded by `test` to rebuild
// the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub exp:          String,
    pub log_root:     String,
    pub data_file:    Option<String>,
    pub epochs:       usize,
    pub batch_size:   usize,
    pub lr:           f64,
    pub gamma:        f64,
    pub gpu_id:       Option<usize>,
    pub cpu:          bool,
    pub val_interval: usize,
    pub plot_freq:    usize,
    pub snr_db:       f64,
    /// Feed clean sensor values; older configs without the field
    /// were always noisy
    #[serde(default)]
    pub no_noise:     bool,
    pub train_range:  IndexRange,
    pub val_range:    IndexRange,
    pub num_workers:  usize,
    pub seed:         u64,
    pub fc_height:    usize,
    pub fc_width:     usize,
    pub hidden:       usize,
    pub channels:     usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            exp:          "recon_cnn_cylinder_8_snr80".to_string(),
            log_root:     "logs".to_string(),
            data_file:    None,
            epochs:       300,
            batch_size:   16,
            lr:           1e-3,
            gamma:        0.98,
            gpu_id:       None,
            cpu:          false,
            val_interval: 1,
            plot_freq:    10,
            snr_db:       80.0,
            no_noise:     false,
            train_range:  IndexRange::new(0, 3500),
            val_range:    IndexRange::new(3500, 4250),
            num_workers:  4,
            seed:         42,
            fc_height:    7,
            fc_width:     12,
            hidden:       128,
            channels:     64,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would make the run meaningless before
    /// any data is loaded or directory created.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.exp.trim().is_empty(), "experiment name must not be empty");
        ensure!(self.epochs > 0, "epochs must be > 0");
        ensure!(self.batch_size > 0, "batch size must be > 0");
        ensure!(self.lr > 0.0 && self.lr <= 1.0, "learning rate must be in (0, 1], got {}", self.lr);
        ensure!(self.gamma > 0.0 && self.gamma <= 1.0, "gamma must be in (0, 1], got {}", self.gamma);
        ensure!(self.val_interval > 0, "validation interval must be > 0");
        ensure!(self.plot_freq > 0, "plot frequency must be > 0");
        ensure!(self.snr_db.is_finite(), "SNR must be finite, got {}", self.snr_db);
        ensure!(!self.train_range.is_empty(), "train range {} is empty", self.train_range);
        ensure!(!self.val_range.is_empty(), "validation range {} is empty", self.val_range);
        ensure!(
            self.fc_height > 0 && self.fc_width > 0 && self.hidden > 0 && self.channels > 0,
            "model sizes must be > 0"
        );
        Ok(())
    }

    pub fn model_config(&self, sensor_num: usize) -> CnnReconConfig {
        CnnReconConfig::new(sensor_num, self.fc_height, self.fc_width)
            .with_hidden(self.hidden)
            .with_channels(self.channels)
    }

    /// Grid shape the configured model reconstructs.
    pub fn output_shape(&self) -> (usize, usize) {
        // sensor count does not affect the output grid
        self.model_config(1).output_shape()
    }
}

/// Fail unless `source` has every snapshot in `ranges` and the
/// grid `model_shape` the model produces.
pub fn check_source(source: &dyn FieldSource, model_shape: (usize, usize), ranges: &[IndexRange]) -> Result<()> {
    ensure!(
        source.shape() == model_shape,
        "data grid {:?} does not match model output {:?} (16 × fc size)",
        source.shape(),
        model_shape
    );
    for r in ranges {
        ensure!(
            r.fits(source.len()),
            "index range {} exceeds the {} available snapshots",
            r,
            source.len()
        );
    }
    Ok(())
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Experiment directories ────────────────────────────────────
        let exp = Experiment::prepare(&cfg.log_root, &cfg.exp)?;

        // ── Step 3 / 4: Snapshots, checked against the model grid ────────────
        let source: Arc<dyn FieldSource> = open_source(cfg.data_file.as_deref())?;
        check_source(source.as_ref(), cfg.output_shape(), &[cfg.train_range, cfg.val_range])?;

        // ── Step 5: Datasets ──────────────────────────────────────────────────
        // Both splits redraw noise on every read, like the sensors would
        let (height, width) = source.shape();
        let layout = SensorLayout::cylinder_wake(height, width)?;
        let noise  = NoiseMode::random(cfg.snr_db, !cfg.no_noise);
        let train_dataset = CylinderSnrDataset::new(source.clone(), layout.clone(), cfg.train_range, noise);
        let val_dataset   = CylinderSnrDataset::new(source, layout, cfg.val_range, noise);
        tracing::info!(
            "Split: {} train ({}), {} validation ({}), noise {:?}",
            cfg.train_range.len(), cfg.train_range,
            cfg.val_range.len(), cfg.val_range,
            noise
        );

        // ── Step 6: Save config for the test pass ─────────────────────────────
        // A rerun must not leave the previous run's weights paired with
        // this config
        let ckpt_manager = CheckpointManager::new(exp.ckpt_dir())?;
        ckpt_manager.clear_best()?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 7: Training loop (Layer 5) ───────────────────────────────────
        if cfg.cpu {
            run_training::<CpuBackend>(cfg, &exp, train_dataset, val_dataset, ckpt_manager, cpu_device())
        } else {
            run_training::<GpuBackend>(cfg, &exp, train_dataset, val_dataset, ckpt_manager, wgpu_device(cfg.gpu_id))
        }
    }
}
