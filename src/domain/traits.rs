// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The data layer only needs one seam: something that can hand
// out full-field snapshots by index. A `.npy` file on disk and
// the analytic wake generator both implement it, and the dataset
// works with either without changes.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

// ─── FieldSource ──────────────────────────────────────────────────────────────
/// Any component that can provide snapshots of a 2D scalar field.
///
/// Implementations:
///   - NpyFieldSource → snapshots stored in a `[N, H, W]` .npy array
///   - SyntheticWake  → analytic vortex street computed on demand
///
/// `Send + Sync` because Burn's DataLoader reads the dataset from
/// its worker threads.
pub trait FieldSource: Send + Sync {
    /// Number of snapshots available.
    fn len(&self) -> usize;

    /// Grid shape as `(height, width)`.
    fn shape(&self) -> (usize, usize);

    /// Row-major field values of snapshot `index`, or None if out of range.
    fn snapshot(&self, index: usize) -> Option<Vec<f32>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
