// ============================================================
// Layer 5 — Training Graphs
// ============================================================
// A graph decides how the training loop runs around a model:
// which loss each step reports, how often validation happens,
// and when to stop early.
//
//   BasicRegression — every epoch up to max_epochs, validation
//                     every `val_every_n_epochs`
//   EarlyStopping   — stops once validation loss has not improved
//                     by `min_delta` for `patience` validations

use crate::domain::args::ArgSpec;
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;
use crate::infra::metrics::EpochMetrics;
use crate::ml::traits::TrainingGraph;

// ─── BasicRegression ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BasicRegressionGraph {
    hparams:            HParams,
    val_every_n_epochs: usize,
}

impl BasicRegressionGraph {
    pub const NAME: &'static str = "BasicRegression";

    pub fn schema() -> Vec<ArgSpec> {
        vec![ArgSpec::int("val_every_n_epochs", "1", "Run validation every N epochs.")]
    }

    pub fn from_hparams(hp: &HParams) -> Result<Self> {
        let val_every_n_epochs = hp.get_usize("val_every_n_epochs")?;
        if val_every_n_epochs == 0 {
            return Err(BodaError::HparamType {
                key:      "val_every_n_epochs".into(),
                expected: "positive integer",
            });
        }
        Ok(Self { hparams: hp.clone(), val_every_n_epochs })
    }
}

impl TrainingGraph for BasicRegressionGraph {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn hparams(&self) -> &HParams {
        &self.hparams
    }

    fn should_validate(&self, epoch: usize) -> bool {
        epoch % self.val_every_n_epochs == 0
    }
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EarlyStoppingGraph {
    hparams:   HParams,
    patience:  usize,
    min_delta: f64,
}

impl EarlyStoppingGraph {
    pub const NAME: &'static str = "EarlyStopping";

    pub fn schema() -> Vec<ArgSpec> {
        vec![
            ArgSpec::int("patience", "5", "Validations without improvement before stopping."),
            ArgSpec::float("min_delta", "0.0", "Smallest validation loss decrease that counts."),
        ]
    }

    pub fn from_hparams(hp: &HParams) -> Result<Self> {
        let patience  = hp.get_usize("patience")?;
        let min_delta = hp.get_f64("min_delta")?;
        if patience == 0 {
            return Err(BodaError::HparamType { key: "patience".into(), expected: "positive integer" });
        }
        if min_delta < 0.0 {
            return Err(BodaError::HparamType { key: "min_delta".into(), expected: "non-negative number" });
        }
        Ok(Self { hparams: hp.clone(), patience, min_delta })
    }

    /// Validations since the best one so far
    fn stale_validations(&self, history: &[EpochMetrics]) -> Option<usize> {
        let mut best = f64::INFINITY;
        let mut stale = None;
        for m in history.iter().filter(|m| m.val_loss.is_finite()) {
            if m.is_improvement(best - self.min_delta) {
                best = m.val_loss;
                stale = Some(0);
            } else if let Some(n) = stale.as_mut() {
                *n += 1;
            }
        }
        stale
    }
}

impl TrainingGraph for EarlyStoppingGraph {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn hparams(&self) -> &HParams {
        &self.hparams
    }

    fn should_stop(&self, history: &[EpochMetrics]) -> bool {
        match self.stale_validations(history) {
            Some(stale) if stale >= self.patience => {
                tracing::info!("Early stopping: no improvement for {} validations", stale);
                true
            }
            _ => false,
        }
    }
}

// ─── Registry Dispatch ────────────────────────────────────────────────────────

/// Every registered graph, built and ready to compose
#[derive(Debug, Clone)]
pub enum GraphKind {
    Basic(BasicRegressionGraph),
    EarlyStopping(EarlyStoppingGraph),
}

impl GraphKind {
    pub fn name(&self) -> &'static str {
        match self {
            GraphKind::Basic(g)         => g.name(),
            GraphKind::EarlyStopping(g) => g.name(),
        }
    }
}
