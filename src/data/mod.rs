// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from stored (or generated) flow snapshots to
// GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   .npy file / analytic wake
//       │
//       ▼
//   FieldSource         → full-field snapshots by index
//       │
//       ▼
//   SensorLayout        → sparse sensor values (domain layer)
//       │
//       ▼
//   noise               → Gaussian noise at a given SNR
//       │
//       ▼
//   CylinderSnrDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   FieldBatcher        → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader          → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads `[N, H, W]` snapshot arrays from .npy files
pub mod loader;

/// Analytic vortex-street field used when no data file is given
pub mod synthetic;

/// SNR-controlled Gaussian sensor noise
pub mod noise;

/// Implements Burn's Dataset trait for sensor/field pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

use std::sync::Arc;

use anyhow::Result;

use crate::domain::traits::FieldSource;

/// Open the snapshot source a run asks for: the .npy file when a
/// path is given, otherwise the default synthetic wake.
pub fn open_source(data_file: Option<&str>) -> Result<Arc<dyn FieldSource>> {
    match data_file {
        Some(path) => Ok(Arc::new(loader::NpyFieldSource::open(path)?)),
        None => {
            tracing::warn!("No --data-file given, using the synthetic cylinder wake");
            Ok(Arc::new(synthetic::SyntheticWake::default()))
        }
    }
}
