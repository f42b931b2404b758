// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run leaves behind, and moving it around:
//
//   checkpoint.rs — boda_checkpoint.json: module names,
//                   hyperparameters, weight bytes, run stamp
//   metrics.rs    — per-epoch metrics.csv in the run directory
//   artifact.rs   — tar.gz packaging, deposit, validation and
//                   extraction of run directories
//   transfer.rs   — gsutil / aws s3 copies with retry

/// Checkpoint record and weight encoding
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Artifact archives
pub mod artifact;

/// Cloud copy commands
pub mod transfer;
