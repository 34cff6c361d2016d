// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a trained model over a test loader and reports three
// errors, each averaged over test SAMPLES (not batches), so a
// short last batch carries exactly its share of the weight:
//
//   mae     mean absolute error over all grid points
//   rel_l2  per-sample ‖y − ŷ‖₂ / ‖y‖₂
//   max_ae  per-sample max |y − ŷ|
//
// Per batch we accumulate `batch_mae · n` for MAE and plain sums
// of the per-sample values for the other two, then divide by the
// total sample count at the end.

use std::sync::Arc;

use burn::{data::dataloader::DataLoader, prelude::*};
use serde::{Deserialize, Serialize};

use crate::data::batcher::FieldBatch;
use crate::ml::model::CnnRecon;

/// Guards the relative error against an all-zero reference field
const NORM_FLOOR: f32 = 1e-12;

/// Error sums for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchErrors {
    pub samples:    usize,
    pub mae:        f64,
    pub rel_l2_sum: f64,
    pub max_ae_sum: f64,
}

/// Final sample-weighted test metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub samples: usize,
    pub mae:     f64,
    pub rel_l2:  f64,
    pub max_ae:  f64,
}

/// Compute the error sums of `preds` against `targets`, both [N, 1, H, W].
pub fn batch_errors<B: Backend>(targets: Tensor<B, 4>, preds: Tensor<B, 4>) -> BatchErrors {
    let samples = targets.dims()[0];
    let diff    = targets.clone() - preds;

    let mae = diff.clone().abs().mean().into_scalar().elem::<f64>();

    let err_norm = (diff.clone() * diff.clone()).flatten::<2>(1, 3).sum_dim(1).sqrt();
    let ref_norm = (targets.clone() * targets).flatten::<2>(1, 3).sum_dim(1).sqrt()
        .clamp_min(NORM_FLOOR);
    let rel_l2_sum = (err_norm / ref_norm).sum().into_scalar().elem::<f64>();

    let max_ae_sum = diff.abs().flatten::<2>(1, 3).max_dim(1).sum().into_scalar().elem::<f64>();

    BatchErrors { samples, mae, rel_l2_sum, max_ae_sum }
}

/// Running sample-weighted mean of per-batch mean values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMean {
    sum:   f64,
    count: usize,
}

impl SampleMean {
    /// Add a batch whose mean value is `batch_mean` over `n` samples.
    pub fn add(&mut self, batch_mean: f64, n: usize) {
        self.sum   += batch_mean * n as f64;
        self.count += n;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// NaN when nothing was added.
    pub fn mean(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.sum / self.count as f64 }
    }
}

/// Folds BatchErrors into TestMetrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorAccumulator {
    mae:     SampleMean,
    rel_sum: f64,
    max_sum: f64,
}

impl ErrorAccumulator {
    pub fn add(&mut self, b: &BatchErrors) {
        self.mae.add(b.mae, b.samples);
        self.rel_sum += b.rel_l2_sum;
        self.max_sum += b.max_ae_sum;
    }

    pub fn finish(&self) -> TestMetrics {
        let samples = self.mae.count();
        let per_sample = |sum: f64| if samples == 0 { f64::NAN } else { sum / samples as f64 };
        TestMetrics {
            samples,
            mae:    self.mae.mean(),
            rel_l2: per_sample(self.rel_sum),
            max_ae: per_sample(self.max_sum),
        }
    }
}

/// Run `model` over every batch of `loader` and return the test metrics.
pub fn run_test<B: Backend>(
    model:  &CnnRecon<B>,
    loader: Arc<dyn DataLoader<FieldBatch<B>>>,
) -> TestMetrics {
    let mut acc = ErrorAccumulator::default();
    for (i, batch) in loader.iter().enumerate() {
        let preds  = model.forward(batch.inputs);
        let errors = batch_errors(batch.targets, preds);
        tracing::debug!("Test batch {}: {:?}", i, errors);
        acc.add(&errors);
    }
    acc.finish()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn field(values: [[f32; 2]; 2]) -> [[[f32; 2]; 2]; 1] {
        [values]
    }

    #[test]
    fn test_batch_errors_by_hand() {
        let device  = Default::default();
        // sample 0: truth [3,4,0,0], pred [0,0,0,0] → diff norm 5, ref norm 5, max 4
        // sample 1: truth [1,1,1,1], pred [1,1,1,3] → diff norm 2, ref norm 2, max 2
        let targets = Tensor::<TestBackend, 4>::from_floats(
            [field([[3.0, 4.0], [0.0, 0.0]]), field([[1.0, 1.0], [1.0, 1.0]])],
            &device,
        );
        let preds = Tensor::<TestBackend, 4>::from_floats(
            [field([[0.0, 0.0], [0.0, 0.0]]), field([[1.0, 1.0], [1.0, 3.0]])],
            &device,
        );
        let e = batch_errors(targets, preds);
        assert_eq!(e.samples, 2);
        assert!((e.mae - 9.0 / 8.0).abs() < 1e-6);
        assert!((e.rel_l2_sum - 2.0).abs() < 1e-5);
        assert!((e.max_ae_sum - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_reference_does_not_divide_by_zero() {
        let device  = Default::default();
        let targets = Tensor::<TestBackend, 4>::zeros([1, 1, 2, 2], &device);
        let e       = batch_errors(targets.clone(), targets);
        assert_eq!(e.rel_l2_sum, 0.0);
    }

    #[test]
    fn test_metrics_are_sample_weighted() {
        let mut acc = ErrorAccumulator::default();
        // a full batch of 4 and a short last batch of 1
        acc.add(&BatchErrors { samples: 4, mae: 1.0, rel_l2_sum: 0.4, max_ae_sum: 8.0 });
        acc.add(&BatchErrors { samples: 1, mae: 6.0, rel_l2_sum: 0.6, max_ae_sum: 2.0 });
        let m = acc.finish();
        assert_eq!(m.samples, 5);
        // (1·4 + 6·1) / 5, not the batch average (1 + 6) / 2
        assert!((m.mae - 2.0).abs() < 1e-12);
        assert!((m.rel_l2 - 0.2).abs() < 1e-12);
        assert!((m.max_ae - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_accumulator_is_nan() {
        let m = ErrorAccumulator::default().finish();
        assert_eq!(m.samples, 0);
        assert!(m.mae.is_nan() && m.rel_l2.is_nan() && m.max_ae.is_nan());
    }
}
