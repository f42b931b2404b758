// ============================================================
// Layer 5 — Model and Graph Capabilities
// ============================================================
// A trainable unit is assembled from two independent halves:
//
//   RegressionModel — architecture: forward pass and loss
//   TrainingGraph   — training strategy: what each step does,
//                     when to validate, when to stop
//
// ComposedModule (composer.rs) holds one of each and the trainer
// drives them together.

use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::MpraBatch;
use crate::data::encoding::{is_nucleotide_string, one_hot, NUM_BASES};
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;
use crate::infra::metrics::EpochMetrics;
use crate::ml::{Device, InferBackend};

/// Input and output dimensions a model was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoShape {
    pub num_features: usize,
    pub seq_len:      usize,
    pub target_len:   usize,
}

/// Mean squared error over every prediction
pub fn mse_loss<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    MseLoss::new().forward(predictions, targets, Reduction::Mean)
}

pub trait RegressionModel<B: Backend>: Module<B> {
    fn io_shape(&self) -> IoShape;

    /// inputs: [batch, num_features, seq_len] → [batch, target_len]
    fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2>;

    fn loss(&self, predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        mse_loss(predictions, targets)
    }
}

pub trait TrainingGraph {
    fn name(&self) -> &'static str;

    /// Hyperparameters this graph declared
    fn hparams(&self) -> &HParams;

    fn training_step<B, M>(&self, model: &M, batch: MpraBatch<B>) -> Tensor<B, 1>
    where
        B: AutodiffBackend,
        M: RegressionModel<B>,
    {
        model.loss(model.forward(batch.inputs), batch.targets)
    }

    fn validation_step<B, M>(&self, model: &M, batch: MpraBatch<B>) -> Tensor<B, 1>
    where
        B: Backend,
        M: RegressionModel<B>,
    {
        model.loss(model.forward(batch.inputs), batch.targets)
    }

    fn test_step<B, M>(&self, model: &M, batch: MpraBatch<B>) -> Tensor<B, 1>
    where
        B: Backend,
        M: RegressionModel<B>,
    {
        model.loss(model.forward(batch.inputs), batch.targets)
    }

    /// Run the validation loop after this (1-based) epoch?
    fn should_validate(&self, _epoch: usize) -> bool {
        true
    }

    /// Stop before `max_epochs` is reached?
    fn should_stop(&self, _history: &[EpochMetrics]) -> bool {
        false
    }
}

/// A restored model ready for inference
pub trait Predictor {
    fn expected_shape(&self) -> IoShape;

    fn predict(&self, inputs: Tensor<InferBackend, 3>) -> Tensor<InferBackend, 2>;

    /// One row of predicted activity per DNA sequence
    fn predict_sequences(&self, sequences: &[String], device: &Device) -> Result<Vec<Vec<f32>>> {
        let shape = self.expected_shape();
        if shape.num_features != NUM_BASES {
            return Err(BodaError::ShapeMismatch(format!(
                "model expects {} input channels, sequences encode {}",
                shape.num_features, NUM_BASES
            )));
        }
        if let Some(bad) = sequences.iter().find(|s| !is_nucleotide_string(s)) {
            return Err(BodaError::Data(format!("'{bad}' is not a nucleotide sequence")));
        }
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let flat: Vec<f32> = sequences.iter().flat_map(|s| one_hot(s, shape.seq_len)).collect();
        let inputs = Tensor::<InferBackend, 1>::from_floats(flat.as_slice(), device)
            .reshape([sequences.len(), NUM_BASES, shape.seq_len]);

        let values = self
            .predict(inputs)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| BodaError::ShapeMismatch(format!("{e:?}")))?;
        Ok(values.chunks(shape.target_len.max(1)).map(<[f32]>::to_vec).collect())
    }
}

impl<M: RegressionModel<InferBackend>> Predictor for M {
    fn expected_shape(&self) -> IoShape {
        self.io_shape()
    }

    fn predict(&self, inputs: Tensor<InferBackend, 3>) -> Tensor<InferBackend, 2> {
        self.forward(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::args::ParsedArgs;
    use crate::ml::model::MpraRegressionConfig;

    fn model(seq_len: &str) -> crate::ml::model::MpraRegressionModel<InferBackend> {
        let schema = MpraRegressionConfig::schema();
        let hp = ParsedArgs::from_defaults(&schema, &[("seq_len", seq_len)])
            .unwrap()
            .extract(&schema)
            .unwrap();
        MpraRegressionConfig::from_hparams(&hp).unwrap().init(&Device::default())
    }

    #[test]
    fn test_mse_loss_value() {
        let device = Device::default();
        let p = Tensor::<InferBackend, 2>::from_floats([[1.0], [3.0]], &device);
        let t = Tensor::<InferBackend, 2>::from_floats([[0.0], [1.0]], &device);
        let loss: f32 = mse_loss(p, t).into_scalar();
        // (1 + 4) / 2
        assert!((loss - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_predict_sequences_one_row_each() {
        let m = model("120");
        let rows = m
            .predict_sequences(&["ACGT".to_string(), "TTTTGGGGCCCC".to_string()], &Device::default())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 1 && r[0].is_finite()));
    }

    #[test]
    fn test_predict_rejects_non_dna() {
        let m = model("120");
        let err = m.predict_sequences(&["ACGX".to_string()], &Device::default()).unwrap_err();
        assert!(matches!(err, BodaError::Data(_)));
    }
}
