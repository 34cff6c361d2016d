// ============================================================
// Layer 4 — Snapshot Loader
// ============================================================
// Reads the simulated cylinder wake from a single .npy array of
// shape [N, H, W] (snapshot, row, column), f32. The whole array
// is kept in memory: 5000 × 112 × 192 floats is ~430 MB, which
// is the same footprint the simulation export has on disk.

use anyhow::{Context, Result};
use ndarray::{Array3, Axis};
use ndarray_npy::read_npy;
use std::path::Path;

use crate::domain::traits::FieldSource;

/// Field snapshots loaded from a .npy file.
pub struct NpyFieldSource {
    data: Array3<f32>,
}

impl NpyFieldSource {
    /// Load `path`. Fails if the file is missing or not a 3D f32 array.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data: Array3<f32> = read_npy(path)
            .with_context(|| format!("Cannot read field snapshots from '{}'", path.display()))?;
        let (n, h, w) = data.dim();
        anyhow::ensure!(n > 0 && h > 0 && w > 0, "'{}' holds an empty array", path.display());
        tracing::info!("Loaded {} snapshots of {}x{} from '{}'", n, h, w, path.display());
        Ok(Self { data })
    }
}

impl FieldSource for NpyFieldSource {
    fn len(&self) -> usize {
        self.data.dim().0
    }

    fn shape(&self) -> (usize, usize) {
        let (_, h, w) = self.data.dim();
        (h, w)
    }

    fn snapshot(&self, index: usize) -> Option<Vec<f32>> {
        if index >= self.len() {
            return None;
        }
        // iter() walks in logical (row-major) order whatever the memory layout
        Some(self.data.index_axis(Axis(0), index).iter().copied().collect())
    }
}
