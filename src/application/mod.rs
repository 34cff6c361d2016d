// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for the two things a user can
// do: train a reconstruction model, and test a trained one.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination and backend dispatch
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// The checkpoint evaluation workflow
pub mod test_use_case;
