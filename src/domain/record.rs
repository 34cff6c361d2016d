// ============================================================
// Layer 3 — Best Validation Record
// ============================================================
// Tracks the lowest validation loss seen so far. A checkpoint is
// written only when a new loss is strictly lower than every
// previous one; ties keep the older checkpoint.

use serde::{Deserialize, Serialize};

/// Epoch and loss of the best validation pass so far.
/// `epoch` is None until the first validation has run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestRecord {
    pub epoch: Option<usize>,
    pub loss:  f64,
}

impl Default for BestRecord {
    fn default() -> Self {
        Self { epoch: None, loss: f64::INFINITY }
    }
}

impl BestRecord {
    /// Returns true if `loss` beats the current best
    pub fn is_improvement(&self, loss: f64) -> bool {
        loss < self.loss
    }

    /// Record `loss` for `epoch` if it is an improvement.
    /// Returns true when the record changed (i.e. a checkpoint is due).
    pub fn update(&mut self, epoch: usize, loss: f64) -> bool {
        if !self.is_improvement(loss) {
            return false;
        }
        self.epoch = Some(epoch);
        self.loss  = loss;
        true
    }
}
