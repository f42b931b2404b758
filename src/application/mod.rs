// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for each command. No tensor
// code and no printing here; the CLI layer presents results.
//
//   registry.rs         — module name → schema + constructors
//   train_use_case.rs   — train, checkpoint, package, deposit
//   unpack_use_case.rs  — fetch and extract an artifact
//   predict_use_case.rs — restore a model and score sequences

/// Data, model and graph registries
pub mod registry;

/// The training workflow
pub mod train_use_case;

/// Artifact download and extraction
pub mod unpack_use_case;

/// Model restoration and inference
pub mod predict_use_case;
