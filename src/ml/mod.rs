// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn training and evaluation code lives here.
//
//   model.rs      CNN reconstruction network
//                  sensors → MLP → coarse feature map →
//                  4 × (transposed conv ×2 + conv) → field
//
//   trainer.rs    the training loop: Adam steps with per-epoch
//                  exponential learning-rate decay, periodic
//                  validation, best-checkpoint saving, plots
//
//   evaluator.rs  the test loop and its error metrics
//                  (MAE, relative L2, max absolute error)
//
//   backend.rs    picks the Burn backend / device for a run
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// CNN field reconstruction model
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Test loop and sample-weighted error metrics
pub mod evaluator;

/// Backend and device selection
pub mod backend;
