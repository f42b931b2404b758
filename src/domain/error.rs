// ============================================================
// Layer 3 — Error Types
// ============================================================
// Every library layer (domain, data, ml, infra) returns this
// error. The application and CLI layers wrap it in anyhow with
// extra context.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the training harness
#[derive(Error, Debug)]
pub enum BodaError {
    // Registry errors
    #[error("Unknown module '{name}' in {registry} registry (available: {available})")]
    UnknownModule {
        registry:  &'static str,
        name:      String,
        available: String,
    },

    // Hyperparameter errors
    #[error("Missing hyperparameter: {0}")]
    MissingHparam(String),

    #[error("Hyperparameter '{key}' has the wrong type (expected {expected})")]
    HparamType { key: String, expected: &'static str },

    #[error("Unsupported optimizer '{0}' (expected 'Adam' or 'RMS')")]
    UnsupportedOptimizer(String),

    #[error("Invalid layer geometry at {stage}: output length would be {length}")]
    InvalidGeometry { stage: String, length: i64 },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    // Data errors
    #[error("Data error: {0}")]
    Data(String),

    // Checkpoint / artifact errors
    #[error("Checkpoint not found at {0}")]
    CheckpointMissing(PathBuf),

    #[error("Invalid artifact archive at {path}: {reason}")]
    ArchiveInvalid { path: PathBuf, reason: String },

    #[error("Artifact transfer to {destination} failed: {cause}")]
    TransferFailed { destination: String, cause: String },

    #[error("Weight record error: {0}")]
    Recorder(String),

    // Argument parsing
    #[error(transparent)]
    Args(#[from] clap::Error),

    // I/O and serialization
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the library layers
pub type Result<T> = std::result::Result<T, BodaError>;
