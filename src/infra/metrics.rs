// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch to <work_dir>/metrics.csv so the
// learning curve ships inside the packaged artifact.
//
//   epoch,train_loss,val_loss
//   1,0.412300,0.398100
//   2,0.301200,NaN        ← validation skipped this epoch

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::Result;

pub const METRICS_FILE: &str = "metrics.csv";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average MSE over all training batches
    pub train_loss: f64,

    /// Average MSE on the validation split, NaN when not validated
    pub val_loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// Returns true if this epoch beats the given validation loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file
#[derive(Debug, Clone)]
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Creates the directory and writes the header for a new file
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let csv_path = dir.join(METRICS_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.val_loss)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
