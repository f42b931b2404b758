// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer. No burn, no
// file I/O.
//
//   error.rs   — BodaError, the library-wide error enum
//   hparams.rs — HValue / HParams, a module's hyperparameter record
//   args.rs    — ArgSpec schemas and the values parsed against them

/// Library error type
pub mod error;

/// Hyperparameter records
pub mod hparams;

/// Argument schemas and parsed values
pub mod args;
