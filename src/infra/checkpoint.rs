// ============================================================
// Layer 6 — Checkpoint Record
// ============================================================
// Everything needed to rebuild a trained model lives in one file,
// <work_dir>/boda_checkpoint.json:
//
//   data_module  / data_hparams   — which dataset, which settings
//   model_module / model_hparams  — registry key + architecture
//   graph_module / graph_hparams  — training strategy
//   model_state_dict              — weights (burn BinBytesRecorder)
//   timestamp, random_tag         — run identity
//
// Restoring is registry lookup + hyperparameters + weight bytes.

use burn::{
    module::Module,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::backend::Backend,
};
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;

pub const CHECKPOINT_FILE: &str = "boda_checkpoint.json";

type WeightsRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// Timestamp plus random tag identifying one training run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStamp {
    /// Local time, `YYYYMMDD_HHMMSS`
    pub timestamp:  String,
    /// Six-digit disambiguation tag
    pub random_tag: u32,
}

impl RunStamp {
    pub fn now() -> Self {
        Self {
            timestamp:  Local::now().format("%Y%m%d_%H%M%S").to_string(),
            random_tag: rand::thread_rng().gen_range(100_000..=999_999),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub data_module:      String,
    pub data_hparams:     HParams,
    pub model_module:     String,
    pub model_hparams:    HParams,
    pub graph_module:     String,
    pub graph_hparams:    HParams,
    pub model_state_dict: Vec<u8>,
    pub timestamp:        String,
    pub random_tag:       u32,
}

impl CheckpointRecord {
    /// Writes `<dir>/boda_checkpoint.json`, returns the file path
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(CHECKPOINT_FILE);
        fs::write(&path, serde_json::to_vec(self)?)?;
        tracing::debug!(
            "Saved checkpoint '{}' ({} weight bytes)",
            path.display(),
            self.model_state_dict.len()
        );
        Ok(path)
    }

    /// Reads the checkpoint inside an extracted artifact directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Self::load_file(&dir.join(CHECKPOINT_FILE))
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BodaError::CheckpointMissing(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Serialize a module's parameters at full precision
pub fn encode_weights<B: Backend, M: Module<B>>(module: M) -> Result<Vec<u8>> {
    <WeightsRecorder as Recorder<B>>::record(&WeightsRecorder::default(), module.into_record(), ())
        .map_err(|e| BodaError::Recorder(e.to_string()))
}

/// Load parameters produced by `encode_weights` into a freshly built module
pub fn decode_weights<B: Backend, M: Module<B>>(
    module: M,
    bytes:  Vec<u8>,
    device: &B::Device,
) -> Result<M> {
    let record = <WeightsRecorder as Recorder<B>>::load::<M::Record>(
        &WeightsRecorder::default(),
        bytes,
        device,
    )
    .map_err(|e| BodaError::Recorder(e.to_string()))?;
    Ok(module.load_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hparams::HValue;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};

    type TestBackend = NdArray<f32>;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("boda-{tag}-{}", rand::random::<u32>()))
    }

    #[test]
    fn test_run_stamp_format() {
        let stamp = RunStamp::now();
        assert_eq!(stamp.timestamp.len(), 15);
        assert_eq!(&stamp.timestamp[8..9], "_");
        assert!(stamp.timestamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
        assert!((100_000..=999_999).contains(&stamp.random_tag));
    }

    #[test]
    fn test_checkpoint_file_round_trip() {
        let dir = temp_dir("ckpt");
        let record = CheckpointRecord {
            data_module:      "SyntheticMpra".into(),
            data_hparams:     HParams::new().with("batch_size", HValue::Int(16)),
            model_module:     "MpraRegression".into(),
            model_hparams:    HParams::new().with("weight_decay", HValue::Float(1e-8)),
            graph_module:     "BasicRegression".into(),
            graph_hparams:    HParams::new(),
            model_state_dict: vec![0, 1, 2, 255],
            timestamp:        "20240101_120000".into(),
            random_tag:       123456,
        };
        record.save(&dir).unwrap();
        assert_eq!(CheckpointRecord::load_dir(&dir).unwrap(), record);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_checkpoint() {
        let err = CheckpointRecord::load_dir(&temp_dir("absent")).unwrap_err();
        assert!(matches!(err, BodaError::CheckpointMissing(_)));
    }

    #[test]
    fn test_weights_round_trip_is_bit_identical() {
        let device = Default::default();
        let original: Linear<TestBackend> = LinearConfig::new(6, 3).init(&device);
        let bytes = encode_weights::<TestBackend, _>(original.clone()).unwrap();

        let fresh: Linear<TestBackend> = LinearConfig::new(6, 3).init(&device);
        let restored = decode_weights::<TestBackend, _>(fresh, bytes, &device).unwrap();

        assert_eq!(
            original.weight.val().into_data().to_vec::<f32>().unwrap(),
            restored.weight.val().into_data().to_vec::<f32>().unwrap(),
        );
        let bias = |l: &Linear<TestBackend>| {
            l.bias.as_ref().unwrap().val().into_data().to_vec::<f32>().unwrap()
        };
        assert_eq!(bias(&original), bias(&restored));
    }
}
