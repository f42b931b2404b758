// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches tensors, modules or optimizers.
//
//   conv_dim.rs  — conv/pool output-length arithmetic
//   optimizer.rs — Adam / RMS selection and settings
//   traits.rs    — RegressionModel, TrainingGraph, Predictor
//   model.rs     — the MPRA conv regression architecture
//   graph.rs     — BasicRegression and EarlyStopping graphs
//   composer.rs  — model + graph → one trainable unit
//   trainer.rs   — epoch loop, validation, test phase
//
// Backends: NdArray on the CPU by default, Wgpu with the `wgpu`
// feature. Training wraps either in Autodiff.

/// Conv/pool length arithmetic
pub mod conv_dim;

/// Optimizer selection
pub mod optimizer;

/// Model and graph capabilities
pub mod traits;

/// MPRA regression architecture
pub mod model;

/// Training strategies
pub mod graph;

/// Model + graph composition
pub mod composer;

/// Training loop with validation and test phases
pub mod trainer;

use burn::{backend::Autodiff, tensor::backend::Backend};

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray<f32>;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = Autodiff<InferBackend>;

pub type Device = <InferBackend as Backend>::Device;
