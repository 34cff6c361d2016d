// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing the reconstruction
// problem: where the sensors sit, which snapshots belong to
// which split, and what the best validation result so far is.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Sparse sensor positions on the field grid
pub mod sensor;

// `start..end` snapshot index ranges for train / val / test splits
pub mod range;

// Best-so-far validation record that drives checkpointing
pub mod record;

// Core abstractions (traits) that other layers implement
pub mod traits;
