// ============================================================
// Layer 4 — MPRA Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks a Vec<MpraSample>
// into an input tensor [batch, features, seq_len] and a target
// tensor [batch, target_len].

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MpraSample;

/// A batch ready for the model forward pass
#[derive(Debug, Clone)]
pub struct MpraBatch<B: Backend> {
    /// One-hot sequences — shape: [batch_size, num_features, seq_len]
    pub inputs: Tensor<B, 3>,

    /// Measured activity — shape: [batch_size, target_len]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct MpraBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> MpraBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<MpraSample, MpraBatch<B>> for MpraBatcher<B> {
    fn batch(&self, items: Vec<MpraSample>) -> MpraBatch<B> {
        let batch_size = items.len();
        // All samples of a split share one shape
        let (num_features, seq_len, target_len) = items[0].shape();

        let inputs_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();
        let targets_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.targets.iter().copied())
            .collect();

        let inputs = Tensor::<B, 1>::from_floats(inputs_flat.as_slice(), &self.device)
            .reshape([batch_size, num_features, seq_len]);
        let targets = Tensor::<B, 1>::from_floats(targets_flat.as_slice(), &self.device)
            .reshape([batch_size, target_len]);

        MpraBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = MpraBatcher::<TestBackend>::new(device);
        let items = vec![
            MpraSample::from_sequence("ACGT", vec![1.0, 2.0], 6),
            MpraSample::from_sequence("TTTT", vec![3.0, 4.0], 6),
            MpraSample::from_sequence("GG", vec![5.0, 6.0], 6),
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.inputs.dims(), [3, 4, 6]);
        assert_eq!(batch.targets.dims(), [3, 2]);
    }

    #[test]
    fn test_batch_preserves_values() {
        let device = Default::default();
        let batcher = MpraBatcher::<TestBackend>::new(device);
        let batch = batcher.batch(vec![MpraSample::from_sequence("T", vec![0.25], 2)]);
        // T lives in channel 3, position 0
        let inputs = batch.inputs.into_data().to_vec::<f32>().unwrap();
        assert_eq!(inputs, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![0.25]);
    }
}
