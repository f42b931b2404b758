// ============================================================
// Layer 5 — Optimizer Selection
// ============================================================
// Two optimizers are supported, selected by name:
//
//   "Adam" → Adam, betas (0.9, 0.999), eps 1e-8
//   "RMS"  → centered RMSprop, alpha 0.99, eps 1e-8
//
// Learning rate and weight decay come from the model's
// hyperparameters for both; momentum only applies to RMS.

use burn::optim::{decay::WeightDecayConfig, AdamConfig, RmsPropConfig};

use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;

pub const ADAM_BETAS:  (f32, f32) = (0.9, 0.999);
pub const OPTIM_EPS:   f32 = 1e-8;
pub const RMS_ALPHA:   f32 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Adam,
    RmsProp,
}

impl OptimizerKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "Adam" => Ok(Self::Adam),
            "RMS"  => Ok(Self::RmsProp),
            other  => Err(BodaError::UnsupportedOptimizer(other.to_string())),
        }
    }
}

/// Fully resolved optimizer settings.
///
/// Plain data so the chosen constants can be inspected without
/// touching burn's config types.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSpec {
    pub kind:         OptimizerKind,
    pub lr:           f64,
    pub weight_decay: f32,
    pub momentum:     f32,
    pub betas:        (f32, f32),
    pub alpha:        f32,
    pub epsilon:      f32,
    pub centered:     bool,
}

impl OptimizerSpec {
    pub fn adam(lr: f64, weight_decay: f32) -> Self {
        Self {
            kind: OptimizerKind::Adam,
            lr,
            weight_decay,
            momentum: 0.0,
            betas:    ADAM_BETAS,
            alpha:    0.0,
            epsilon:  OPTIM_EPS,
            centered: false,
        }
    }

    pub fn rms_prop(lr: f64, weight_decay: f32, momentum: f32) -> Self {
        Self {
            kind: OptimizerKind::RmsProp,
            lr,
            weight_decay,
            momentum,
            betas:    (0.0, 0.0),
            alpha:    RMS_ALPHA,
            epsilon:  OPTIM_EPS,
            centered: true,
        }
    }

    /// Reads `optimizer`, `lr`, `weight_decay` and `momentum`
    pub fn from_hparams(hp: &HParams) -> Result<Self> {
        let kind         = OptimizerKind::parse(hp.get_str("optimizer")?)?;
        let lr           = hp.get_f64("lr")?;
        let weight_decay = hp.get_f64("weight_decay")? as f32;
        Ok(match kind {
            OptimizerKind::Adam    => Self::adam(lr, weight_decay),
            OptimizerKind::RmsProp => Self::rms_prop(lr, weight_decay, hp.get_f64("momentum")? as f32),
        })
    }

    fn weight_decay_config(&self) -> Option<WeightDecayConfig> {
        (self.weight_decay > 0.0).then(|| WeightDecayConfig::new(self.weight_decay))
    }

    pub fn adam_config(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.betas.0)
            .with_beta_2(self.betas.1)
            .with_epsilon(self.epsilon)
            .with_weight_decay(self.weight_decay_config())
    }

    pub fn rms_prop_config(&self) -> RmsPropConfig {
        RmsPropConfig::new()
            .with_alpha(self.alpha)
            .with_epsilon(self.epsilon)
            .with_centered(self.centered)
            .with_momentum(self.momentum)
            .with_weight_decay(self.weight_decay_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hparams::HValue;

    fn hparams(optimizer: &str) -> HParams {
        HParams::new()
            .with("optimizer", HValue::Str(optimizer.into()))
            .with("lr", HValue::Float(0.002))
            .with("weight_decay", HValue::Float(1e-4))
            .with("momentum", HValue::Float(0.5))
    }

    #[test]
    fn test_adam_constants() {
        let spec = OptimizerSpec::from_hparams(&hparams("Adam")).unwrap();
        assert_eq!(spec.kind, OptimizerKind::Adam);
        assert_eq!(spec.betas, (0.9, 0.999));
        assert_eq!(spec.epsilon, 1e-8);
        assert_eq!(spec.lr, 0.002);
        assert_eq!(spec.weight_decay, 1e-4);
    }

    #[test]
    fn test_rms_constants() {
        let spec = OptimizerSpec::from_hparams(&hparams("RMS")).unwrap();
        assert_eq!(spec.kind, OptimizerKind::RmsProp);
        assert_eq!(spec.alpha, 0.99);
        assert_eq!(spec.epsilon, 1e-8);
        assert!(spec.centered);
        assert_eq!(spec.momentum, 0.5);
        assert_eq!(spec.lr, 0.002);
        assert_eq!(spec.weight_decay, 1e-4);
    }

    #[test]
    fn test_unknown_optimizer_is_an_error() {
        let err = OptimizerSpec::from_hparams(&hparams("SGD")).unwrap_err();
        assert!(matches!(err, BodaError::UnsupportedOptimizer(name) if name == "SGD"));
    }

    #[test]
    fn test_optimizer_name_is_case_sensitive() {
        assert!(OptimizerKind::parse("adam").is_err());
    }

    #[test]
    fn test_burn_configs_build() {
        let spec = OptimizerSpec::adam(1e-3, 0.0);
        let _ = spec.adam_config();
        let spec = OptimizerSpec::rms_prop(1e-3, 1e-8, 0.9);
        let _ = spec.rms_prop_config();
    }
}
