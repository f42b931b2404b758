// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From raw activity tables to tensor batches:
//
//   activity table / generator
//       │
//       ▼
//   loader / modules  → ActivityRecord rows, one data module each
//       │
//       ▼
//   encoding          → one-hot [4, padded_len] matrices
//       │
//       ▼
//   splitter          → seeded train / val / test splits
//       │
//       ▼
//   MpraDataset       → Burn Dataset
//       │
//       ▼
//   MpraBatcher       → [batch, 4, len] inputs, [batch, targets]

/// Reads tab-separated activity tables
pub mod loader;

/// DNA one-hot encoding
pub mod encoding;

/// Burn Dataset over encoded samples
pub mod dataset;

/// Burn Batcher producing input/target tensors
pub mod batcher;

/// Seeded train/validation/test split
pub mod splitter;

/// Registered data modules
pub mod modules;

use crate::domain::error::Result;
use dataset::MpraDataset;

/// A swappable dataset provider.
///
/// Built from its own hyperparameter record, then `setup` loads or
/// generates the samples before the splits are requested.
pub trait DataModule {
    fn name(&self) -> &'static str;

    fn setup(&mut self) -> Result<()>;

    fn batch_size(&self) -> usize;

    fn train_set(&self) -> MpraDataset;

    fn val_set(&self) -> MpraDataset;

    fn test_set(&self) -> MpraDataset;
}
