use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoding::{one_hot, NUM_BASES};

/// One encoded MPRA measurement.
/// `features` is the flattened [NUM_BASES, seq_len] one-hot matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpraSample {
    pub features: Vec<f32>,
    pub targets:  Vec<f32>,
    pub seq_len:  usize,
}

impl MpraSample {
    pub fn from_sequence(sequence: &str, targets: Vec<f32>, padded_len: usize) -> Self {
        Self { features: one_hot(sequence, padded_len), targets, seq_len: padded_len }
    }

    pub fn num_features(&self) -> usize {
        self.features.len() / self.seq_len.max(1)
    }

    /// (num_features, seq_len, target_len)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.num_features(), self.seq_len, self.targets.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MpraDataset {
    samples: Vec<MpraSample>,
}

impl MpraDataset {
    pub fn new(samples: Vec<MpraSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Shape of the first sample, None for an empty split
    pub fn sample_shape(&self) -> Option<(usize, usize, usize)> {
        self.samples.first().map(MpraSample::shape)
    }
}

impl Dataset<MpraSample> for MpraDataset {
    fn get(&self, index: usize) -> Option<MpraSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let s = MpraSample::from_sequence("ACGTACGT", vec![0.5, 1.5], 10);
        assert_eq!(s.shape(), (NUM_BASES, 10, 2));
    }

    #[test]
    fn test_dataset_access() {
        let ds = MpraDataset::new(vec![
            MpraSample::from_sequence("AC", vec![1.0], 4),
            MpraSample::from_sequence("GT", vec![2.0], 4),
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().targets, vec![2.0]);
        assert!(ds.get(2).is_none());
        assert_eq!(MpraDataset::default().sample_shape(), None);
    }
}
