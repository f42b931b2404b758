// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Rebuilds a trained model from an extracted artifact directory
// and scores DNA sequences with it:
//
//   Step 1: Read boda_checkpoint.json           (Layer 6 - infra)
//   Step 2: Resolve model_module in the registry
//   Step 3: Rebuild from model_hparams + weights (Layer 5 - ml)
//   Step 4: One-hot encode and run inference     (Layer 5 - ml)

use anyhow::{Context, Result};
use std::path::Path;

use crate::application::registry::Registries;
use crate::infra::checkpoint::CheckpointRecord;
use crate::ml::traits::{IoShape, Predictor};
use crate::ml::Device;

/// A restored model on the inference backend (dropout inactive)
pub struct LoadedModel {
    pub model_module: String,
    pub timestamp:    String,
    predictor:        Box<dyn Predictor>,
    device:           Device,
}

impl LoadedModel {
    pub fn shape(&self) -> IoShape {
        self.predictor.expected_shape()
    }

    /// One activity row per input sequence
    pub fn predict(&self, sequences: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.predictor.predict_sequences(sequences, &self.device)?)
    }
}

/// Restore the model stored in `model_dir`
pub fn load_model(registries: &Registries, model_dir: &Path) -> Result<LoadedModel> {
    let record = CheckpointRecord::load_dir(model_dir)?;
    let entry = registries.model.lookup(&record.model_module)?;

    let device = Device::default();
    let predictor = (entry.restore)(&record.model_hparams, record.model_state_dict, &device)
        .with_context(|| format!("Could not restore '{}' from '{}'", record.model_module, model_dir.display()))?;

    tracing::info!("Loaded model from {} in eval mode", record.timestamp);
    Ok(LoadedModel {
        model_module: record.model_module,
        timestamp:    record.timestamp,
        predictor,
        device,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::BodaError;
    use crate::domain::hparams::HParams;
    use crate::infra::checkpoint::encode_weights;
    use crate::ml::model::{MpraRegressionConfig, MODEL_NAME};
    use crate::ml::InferBackend;
    use crate::domain::args::ParsedArgs;
    use std::{fs, path::PathBuf};

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("boda-{tag}-{}", rand::random::<u32>()))
    }

    fn write_checkpoint(dir: &Path, model_module: &str) -> HParams {
        let schema = MpraRegressionConfig::schema();
        let hp = ParsedArgs::from_defaults(&schema, &[("seq_len", "90"), ("target_len", "2")])
            .unwrap()
            .extract(&schema)
            .unwrap();
        let module = MpraRegressionConfig::from_hparams(&hp).unwrap().init::<InferBackend>(&Device::default());
        CheckpointRecord {
            data_module:      "SyntheticMpra".into(),
            data_hparams:     HParams::new(),
            model_module:     model_module.into(),
            model_hparams:    hp.clone(),
            graph_module:     "BasicRegression".into(),
            graph_hparams:    HParams::new(),
            model_state_dict: encode_weights::<InferBackend, _>(module).unwrap(),
            timestamp:        "20240301_101010".into(),
            random_tag:       111111,
        }
        .save(dir)
        .unwrap();
        hp
    }

    #[test]
    fn test_load_and_predict() {
        let dir = temp_dir("predict");
        write_checkpoint(&dir, MODEL_NAME);

        let loaded = load_model(&Registries::standard(), &dir).unwrap();
        assert_eq!(loaded.model_module, MODEL_NAME);
        assert_eq!(loaded.timestamp, "20240301_101010");
        assert_eq!(loaded.shape().seq_len, 90);

        let rows = loaded.predict(&["ACGTACGT".to_string()]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_model_name() {
        let dir = temp_dir("predict-unknown");
        write_checkpoint(&dir, "TransformerRegression");
        let err = load_model(&Registries::standard(), &dir).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BodaError>(),
            Some(BodaError::UnknownModule { .. })
        ));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_checkpoint() {
        let err = load_model(&Registries::standard(), &temp_dir("predict-missing")).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BodaError>(),
            Some(BodaError::CheckpointMissing(_))
        ));
    }
}
