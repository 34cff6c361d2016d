// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of a run:
//
//   experiment.rs  the per-run directory layout
//                   {log_root}/{exp}/{ckpt,figure}
//
//   checkpoint.rs  best-model weights (Burn CompactRecorder),
//                   best_record.json and train_config.json
//
//   metrics.rs     per-epoch CSV (the per-step TensorBoard
//                   event file is written by ml/trainer.rs)
//
//   plot.rs        truth / prediction / error heat maps
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Run directory layout
pub mod experiment;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Per-epoch metrics CSV
pub mod metrics;

/// Field heat-map figures
pub mod plot;
