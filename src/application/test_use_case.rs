// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Evaluates a trained checkpoint on a held-out index range:
//
//   1. open the experiment and reload its train_config.json
//   2. rebuild the CNN with the same sizes
//   3. load the best (or an explicit) checkpoint
//   4. run the test loop with seeded sensor noise
//
// Noise is seeded per snapshot so two test runs of the same
// checkpoint report the same numbers.

use anyhow::{ensure, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::train_use_case::check_source;
use crate::data::{
    batcher::FieldBatcher,
    dataset::{CylinderSnrDataset, NoiseMode},
    open_source,
};
use crate::domain::{range::IndexRange, sensor::SensorLayout};
use crate::infra::{checkpoint::CheckpointManager, experiment::Experiment};
use crate::ml::{
    backend::{cpu_device, wgpu_device, CpuInferBackend, GpuInferBackend},
    evaluator::{run_test, TestMetrics},
    model::{CnnRecon, CnnReconConfig},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub exp:        String,
    pub log_root:   String,
    /// Explicit checkpoint file; the experiment's best when None
    pub snapshot:   Option<String>,
    /// Snapshot file; the one used for training when None
    pub data_file:  Option<String>,
    pub batch_size: usize,
    pub snr_db:     f64,
    pub no_noise:   bool,
    pub test_range: IndexRange,
    pub seed:       u64,
    pub gpu_id:     Option<usize>,
    pub cpu:        bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            exp:        "recon_cnn_cylinder_8_snr80".to_string(),
            log_root:   "logs".to_string(),
            snapshot:   None,
            data_file:  None,
            batch_size: 16,
            snr_db:     80.0,
            no_noise:   false,
            test_range: IndexRange::new(4250, 5000),
            seed:       0,
            gpu_id:     None,
            cpu:        false,
        }
    }
}

pub struct TestUseCase {
    config: TestConfig,
}

impl TestUseCase {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TestMetrics> {
        let cfg = &self.config;
        ensure!(cfg.batch_size > 0, "batch size must be > 0");
        ensure!(!cfg.test_range.is_empty(), "test range {} is empty", cfg.test_range);
        ensure!(cfg.snr_db.is_finite(), "SNR must be finite, got {}", cfg.snr_db);

        let exp  = Experiment::open(&cfg.log_root, &cfg.exp)?;
        let ckpt = CheckpointManager::new(exp.ckpt_dir())?;
        let train_cfg = ckpt.load_config()?;

        let data_file = cfg.data_file.as_deref().or(train_cfg.data_file.as_deref());
        let source    = open_source(data_file)?;
        check_source(source.as_ref(), train_cfg.output_shape(), &[cfg.test_range])?;

        let (height, width) = source.shape();
        let layout    = SensorLayout::cylinder_wake(height, width)?;
        let model_cfg = train_cfg.model_config(layout.len());
        let noise     = NoiseMode::seeded(cfg.snr_db, cfg.seed, !cfg.no_noise);
        let dataset   = CylinderSnrDataset::new(source, layout, cfg.test_range, noise);
        tracing::info!(
            "Testing '{}' on {} snapshots ({}), noise {:?}",
            exp.name(), cfg.test_range.len(), cfg.test_range, noise
        );

        let metrics = if cfg.cpu {
            evaluate::<CpuInferBackend>(cfg, &model_cfg, &ckpt, dataset, cpu_device())?
        } else {
            evaluate::<GpuInferBackend>(cfg, &model_cfg, &ckpt, dataset, wgpu_device(cfg.gpu_id))?
        };
        tracing::info!("{:?}", metrics);
        Ok(metrics)
    }
}

fn evaluate<B: Backend>(
    cfg:       &TestConfig,
    model_cfg: &CnnReconConfig,
    ckpt:      &CheckpointManager,
    dataset:   CylinderSnrDataset,
    device:    B::Device,
) -> Result<TestMetrics> {
    let model: CnnRecon<B> = model_cfg.init(&device);
    let model = ckpt.load_model(model, cfg.snapshot.as_deref().map(Path::new), &device)?;

    let (height, width) = dataset.shape();
    let loader = DataLoaderBuilder::new(FieldBatcher::<B>::new(device, height, width))
        .batch_size(cfg.batch_size)
        .build(dataset);

    Ok(run_test(&model, loader))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::synthetic::SyntheticWake;
    use crate::domain::traits::FieldSource;
    use ndarray::Array3;
    use ndarray_npy::write_npy;

    /// Train a tiny CPU model on a 20-snapshot 16x32 .npy file.
    fn trained_experiment(root: &Path) -> TrainConfig {
        let wake = SyntheticWake::new(20, 16, 32);
        let mut arr = Array3::<f32>::zeros((20, 16, 32));
        for (i, mut snap) in arr.outer_iter_mut().enumerate() {
            let values = wake.snapshot(i).unwrap();
            snap.iter_mut().zip(values).for_each(|(dst, v)| *dst = v);
        }
        let data = root.join("wake.npy");
        write_npy(&data, &arr).unwrap();

        let cfg = TrainConfig {
            exp:         "tiny".to_string(),
            log_root:    root.to_string_lossy().into_owned(),
            data_file:   Some(data.to_string_lossy().into_owned()),
            epochs:      2,
            batch_size:  4,
            train_range: IndexRange::new(0, 10),
            val_range:   IndexRange::new(10, 15),
            num_workers: 1,
            fc_height:   1,
            fc_width:    2,
            hidden:      16,
            channels:    8,
            cpu:         true,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg.clone()).execute().unwrap();
        cfg
    }

    fn test_config(train: &TrainConfig) -> TestConfig {
        TestConfig {
            exp:        train.exp.clone(),
            log_root:   train.log_root.clone(),
            batch_size: 3,
            snr_db:     10.0,
            test_range: IndexRange::new(15, 20),
            cpu:        true,
            ..TestConfig::default()
        }
    }

    #[test]
    fn test_train_then_test_is_reproducible() {
        let tmp   = tempfile::tempdir().unwrap();
        let train = trained_experiment(tmp.path());
        let cfg   = test_config(&train);

        let first = TestUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(first.samples, 5);
        assert!(first.mae.is_finite() && first.mae >= 0.0);
        assert!(first.rel_l2.is_finite());
        // a per-sample max is never below the mean
        assert!(first.max_ae >= first.mae);

        let second = TestUseCase::new(cfg).execute().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_explicit_snapshot_matches_best() {
        let tmp   = tempfile::tempdir().unwrap();
        let train = trained_experiment(tmp.path());
        let ckpt  = CheckpointManager::new(Path::new(&train.log_root).join("tiny/ckpt")).unwrap();
        let best  = ckpt.best_path(ckpt.best_record().unwrap().epoch.unwrap());

        let by_best = TestUseCase::new(test_config(&train)).execute().unwrap();
        let by_path = TestUseCase::new(TestConfig {
            snapshot: Some(best.to_string_lossy().into_owned()),
            ..test_config(&train)
        })
        .execute()
        .unwrap();
        assert_eq!(by_best, by_path);
    }

    #[test]
    fn test_clean_sensors_change_the_metrics() {
        let tmp   = tempfile::tempdir().unwrap();
        let train = trained_experiment(tmp.path());

        let noisy = TestUseCase::new(test_config(&train)).execute().unwrap();
        let clean = TestUseCase::new(TestConfig { no_noise: true, ..test_config(&train) }).execute().unwrap();
        assert_eq!(clean.samples, noisy.samples);
        assert_ne!(clean, noisy);
    }

    #[test]
    fn test_untrained_experiment_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TestConfig {
            log_root: tmp.path().to_string_lossy().into_owned(),
            cpu: true,
            ..TestConfig::default()
        };
        assert!(TestUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_range_beyond_data_is_an_error() {
        let tmp   = tempfile::tempdir().unwrap();
        let train = trained_experiment(tmp.path());
        let cfg   = TestConfig { test_range: IndexRange::new(15, 25), ..test_config(&train) };
        assert!(TestUseCase::new(cfg).execute().is_err());
    }
}
