// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Per epoch:
//   1. one pass over the training loader (autodiff backend),
//      L1 loss, Adam step at the exponentially decayed learning
//      rate; every step's loss goes to a TensorBoard event file
//   2. every `val_interval` epochs a validation pass on the inner
//      backend (model.valid(), no autodiff graph)
//   3. the weights are checkpointed when the validation loss is
//      strictly lower than every previous one
//   4. every `plot_freq` epochs (only on validation epochs) the
//      last sample of the last validation batch is plotted
//
// Losses are averaged over samples, not batches, so a short last
// batch does not skew the epoch loss.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    lr_scheduler::{
        exponential::{ExponentialLrScheduler, ExponentialLrSchedulerConfig},
        LrScheduler,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use tensorboard_rs::summary_writer::SummaryWriter;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::FieldBatcher, dataset::CylinderSnrDataset};
use crate::domain::record::BestRecord;
use crate::infra::{
    checkpoint::CheckpointManager,
    experiment::Experiment,
    metrics::{EpochMetrics, MetricsLogger},
    plot::plot_fields,
};
use crate::ml::evaluator::SampleMean;
use crate::ml::model::{l1_loss, CnnRecon};

/// What a finished training run reports back.
#[derive(Debug, Clone, Copy)]
pub struct TrainSummary {
    pub epochs:     usize,
    pub train_loss: f64,
    pub best:       BestRecord,
}

pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    exp:           &Experiment,
    train_dataset: CylinderSnrDataset,
    val_dataset:   CylinderSnrDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<TrainSummary> {
    tracing::info!("Using device: {:?}", device);

    let (height, width) = train_dataset.shape();
    let model_cfg = cfg.model_config(train_dataset.sensor_num());
    let mut model: CnnRecon<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} sensors → {}x{} field, {} parameters",
        train_dataset.sensor_num(), height, width, model.num_params()
    );

    let mut optim = AdamConfig::new().init::<B, CnnRecon<B>>();
    let mut scheduler = lr_schedule(cfg)?;

    let train_loader = DataLoaderBuilder::new(FieldBatcher::<B>::new(device.clone(), height, width))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    // Validation runs on the inner backend, no autodiff graph
    let val_loader = DataLoaderBuilder::new(FieldBatcher::<B::InnerBackend>::new(device.clone(), height, width))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(val_dataset);

    let metrics     = MetricsLogger::new(exp.root())?;
    let mut tb_writer = SummaryWriter::new(exp.root());
    let mut best    = BestRecord::default();
    let mut step    = 0usize;
    let mut last_train_loss = f64::NAN;

    for epoch in 0..cfg.epochs {
        let lr = scheduler.step();

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss = SampleMean::default();
        for batch in train_loader.iter() {
            let n = batch.inputs.dims()[0];
            let (loss, _) = model.forward_loss(batch.inputs, batch.targets);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            tb_writer.add_scalar("train_loss", loss_val as f32, step);
            train_loss.add(loss_val, n);
            step += 1;
        }
        last_train_loss = train_loss.mean();
        tracing::info!("Epoch: {}, Avg_loss: {}", epoch, last_train_loss);

        // ── Validation phase ──────────────────────────────────────────────────
        let mut val_loss_out = None;
        if epoch % cfg.val_interval == 0 {
            let model_valid = model.valid();
            let mut val_loss = SampleMean::default();
            let mut last     = None;

            for batch in val_loader.iter() {
                let n    = batch.inputs.dims()[0];
                let pred = model_valid.forward(batch.inputs);
                let loss = l1_loss(pred.clone(), batch.targets.clone())
                    .into_scalar().elem::<f64>();
                val_loss.add(loss, n);
                last = Some((batch.targets, pred));
            }

            let val_loss = val_loss.mean();
            tb_writer.add_scalar("val_loss", val_loss as f32, epoch);
            tracing::info!("Epoch: {}, Val_loss: {}", epoch, val_loss);
            val_loss_out = Some(val_loss);

            if best.update(epoch, val_loss) {
                ckpt_manager.save_best(&model_valid, &best)?;
            }

            if epoch % cfg.plot_freq == 0 {
                if let Some((targets, pred)) = last {
                    let truth = last_sample(targets)?;
                    let pred  = last_sample(pred)?;
                    plot_fields(&truth, &pred, height, width, &exp.figure_path(epoch))?;
                }
            }
        }

        metrics.log(&EpochMetrics { epoch, train_loss: last_train_loss, val_loss: val_loss_out, lr })?;
        tb_writer.flush();
    }

    tracing::info!(
        "Training complete! Best val_loss {:.8} at epoch {:?}",
        best.loss, best.epoch
    );
    Ok(TrainSummary { epochs: cfg.epochs, train_loss: last_train_loss, best })
}

/// `lr * gamma^epoch`; the first `step()` yields `lr` itself.
fn lr_schedule(cfg: &TrainConfig) -> Result<ExponentialLrScheduler> {
    ExponentialLrSchedulerConfig::new(cfg.lr, cfg.gamma)
        .init()
        .map_err(|e| anyhow!("invalid learning rate schedule: {e}"))
}

/// Row-major values of the last sample in a [N, 1, H, W] batch.
fn last_sample<B: Backend>(t: Tensor<B, 4>) -> Result<Vec<f32>> {
    let [n, c, h, w] = t.dims();
    t.slice([n - 1..n, 0..c, 0..h, 0..w])
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("{:?}", e))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, sync::Arc};

    use crate::data::{dataset::NoiseMode, synthetic::SyntheticWake};
    use crate::domain::{range::IndexRange, sensor::SensorLayout, traits::FieldSource};
    use crate::ml::backend::CpuBackend;

    fn tiny_config(log_root: &str) -> TrainConfig {
        TrainConfig {
            exp:          "tiny".to_string(),
            log_root:     log_root.to_string(),
            epochs:       3,
            batch_size:   4,
            lr:           1e-3,
            val_interval: 1,
            plot_freq:    2,
            train_range:  IndexRange::new(0, 10),
            val_range:    IndexRange::new(10, 16),
            num_workers:  1,
            fc_height:    1,
            fc_width:     2,
            hidden:       16,
            channels:     8,
            cpu:          true,
            ..TrainConfig::default()
        }
    }

    fn datasets(cfg: &TrainConfig) -> (CylinderSnrDataset, CylinderSnrDataset) {
        let source: Arc<dyn FieldSource> = Arc::new(SyntheticWake::new(20, 16, 32));
        let layout = SensorLayout::cylinder_wake(16, 32).unwrap();
        let noise  = NoiseMode::Random { snr_db: cfg.snr_db };
        (
            CylinderSnrDataset::new(source.clone(), layout.clone(), cfg.train_range, noise),
            CylinderSnrDataset::new(source, layout, cfg.val_range, noise),
        )
    }

    #[test]
    fn test_tiny_run_writes_artifacts() {
        let tmp  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(tmp.path().to_str().unwrap());
        let exp  = Experiment::prepare(&cfg.log_root, &cfg.exp).unwrap();
        let ckpt = CheckpointManager::new(exp.ckpt_dir()).unwrap();
        let (train, val) = datasets(&cfg);

        let summary = run_training::<CpuBackend>(&cfg, &exp, train, val, ckpt, Default::default()).unwrap();
        assert_eq!(summary.epochs, 3);
        assert!(summary.train_loss.is_finite());

        // exactly one best checkpoint survives, and it matches the record
        let ckpt   = CheckpointManager::new(exp.ckpt_dir()).unwrap();
        let record = ckpt.best_record().unwrap();
        assert_eq!(record, summary.best);
        let best_files = fs::read_dir(exp.ckpt_dir()).unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("best_epoch_"))
            .count();
        assert_eq!(best_files, 1);
        assert!(ckpt.best_path(record.epoch.unwrap()).exists());

        // plots on epochs 0 and 2 only
        assert!(exp.figure_path(0).exists());
        assert!(!exp.figure_path(1).exists());
        assert!(exp.figure_path(2).exists());

        let rows = fs::read_to_string(exp.root().join("metrics.csv")).unwrap();
        assert_eq!(rows.lines().count(), 1 + 3);

        // per-step losses land in a TensorBoard event file next to metrics.csv
        let event_file = fs::read_dir(exp.root()).unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().starts_with("events.out.tfevents"))
            .expect("no tensorboard event file written");
        assert!(event_file.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_validation_interval_skips_epochs() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { val_interval: 2, plot_freq: 1, ..tiny_config(tmp.path().to_str().unwrap()) };
        let exp  = Experiment::prepare(&cfg.log_root, &cfg.exp).unwrap();
        let ckpt = CheckpointManager::new(exp.ckpt_dir()).unwrap();
        let (train, val) = datasets(&cfg);

        run_training::<CpuBackend>(&cfg, &exp, train, val, ckpt, Default::default()).unwrap();

        let rows = fs::read_to_string(exp.root().join("metrics.csv")).unwrap();
        let val_cells: Vec<bool> = rows.lines().skip(1)
            .map(|l| !l.split(',').nth(2).unwrap().is_empty())
            .collect();
        assert_eq!(val_cells, vec![true, false, true]);
        // plot_freq 1 still only plots on validation epochs
        assert!(!exp.figure_path(1).exists());
    }

    #[test]
    fn test_lr_schedule_decays_once_per_epoch() {
        let cfg = TrainConfig { lr: 1e-3, gamma: 0.5, ..TrainConfig::default() };
        let mut scheduler = lr_schedule(&cfg).unwrap();
        let lrs: Vec<f64> = (0..3).map(|_| scheduler.step()).collect();
        for (got, want) in lrs.iter().zip([1e-3, 5e-4, 2.5e-4]) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn test_lr_rows_follow_the_decay() {
        let tmp  = tempfile::tempdir().unwrap();
        let cfg  = TrainConfig { gamma: 0.5, ..tiny_config(tmp.path().to_str().unwrap()) };
        let exp  = Experiment::prepare(&cfg.log_root, &cfg.exp).unwrap();
        let ckpt = CheckpointManager::new(exp.ckpt_dir()).unwrap();
        let (train, val) = datasets(&cfg);

        run_training::<CpuBackend>(&cfg, &exp, train, val, ckpt, Default::default()).unwrap();

        let rows = fs::read_to_string(exp.root().join("metrics.csv")).unwrap();
        let lrs: Vec<&str> = rows.lines().skip(1).map(|l| l.rsplit(',').next().unwrap()).collect();
        assert_eq!(lrs, vec!["0.001000", "0.000500", "0.000250"]);
    }

    #[test]
    fn test_last_sample_picks_final_row() {
        let device = Default::default();
        let t = Tensor::<crate::ml::backend::CpuInferBackend, 4>::from_floats(
            [[[[1.0, 2.0]]], [[[3.0, 4.0]]]],
            &device,
        );
        assert_eq!(last_sample(t).unwrap(), vec![3.0, 4.0]);
    }
}
