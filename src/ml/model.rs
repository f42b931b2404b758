// ============================================================
// Layer 5 — MPRA Regression Model
// ============================================================
// Predicts reporter activity from a one-hot DNA sequence:
//
//   Conv1d → tanh → MaxPool1d → Conv1d → tanh → MaxPool1d
//     → flatten
//     → Dropout(p)   → Linear → tanh
//     → Dropout(p)   → Linear → tanh
//     → Dropout(p/2) → Linear(target_len)
//
// The flattened length is derived from the conv/pool chain, so
// any geometry that shrinks the sequence to nothing is rejected
// while reading the hyperparameters.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{MaxPool1d, MaxPool1dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::tanh,
};

use crate::domain::args::ArgSpec;
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;
use crate::infra::checkpoint::decode_weights;
use crate::ml::composer::BuiltModel;
use crate::ml::conv_dim::{derive_chain, WindowGeometry};
use crate::ml::optimizer::OptimizerSpec;
use crate::ml::trainer::{fit_with_graph, load_pretrained, FitOutcome, FitRequest};
use crate::ml::traits::{IoShape, Predictor, RegressionModel};
use crate::ml::{Device, InferBackend, TrainBackend};

pub const MODEL_NAME: &str = "MpraRegression";

#[derive(Debug, Clone, PartialEq)]
pub struct MpraRegressionConfig {
    pub io:                IoShape,
    pub dropout:           f64,
    pub num_channels1:     usize,
    pub conv1:             WindowGeometry,
    pub pool1:             WindowGeometry,
    pub num_channels2:     usize,
    pub conv2:             WindowGeometry,
    pub pool2:             WindowGeometry,
    pub linear_layer_len1: usize,
    pub linear_layer_len2: usize,
    pub optimizer:         OptimizerSpec,
    /// Output lengths of conv1, pool1, conv2, pool2
    pub stage_lens:        Vec<usize>,
}

impl MpraRegressionConfig {
    pub fn schema() -> Vec<ArgSpec> {
        vec![
            // training params
            ArgSpec::float("lr", "0.0005", "Learning rate."),
            ArgSpec::float("momentum", "0.9", "Momentum (RMS optimizer only)."),
            ArgSpec::float("weight_decay", "1e-8", "L2 weight decay."),
            ArgSpec::float("dropout", "0.2", "Dropout rate of the linear stack."),
            ArgSpec::string("optimizer", "Adam", "Optimizer: 'Adam' or 'RMS'."),
            // input shape
            ArgSpec::int("seq_len", "600", "Input sequence length."),
            ArgSpec::int("num_features", "4", "Input channels per position."),
            ArgSpec::int("target_len", "1", "Number of activity values predicted."),
            // network params
            ArgSpec::int("num_channels1", "20", "Filters of the first convolution."),
            ArgSpec::int("kernel_size1", "6", "Kernel size of the first convolution."),
            ArgSpec::int("stride1", "3", "Stride of the first convolution."),
            ArgSpec::int("padding1", "0", "Padding of the first convolution."),
            ArgSpec::int("dilation1", "1", "Dilation of the first convolution."),
            ArgSpec::int("pool_kernel1", "4", "Kernel size of the first max pool."),
            ArgSpec::int("pool_stride1", "2", "Stride of the first max pool."),
            ArgSpec::int("num_channels2", "10", "Filters of the second convolution."),
            ArgSpec::int("kernel_size2", "4", "Kernel size of the second convolution."),
            ArgSpec::int("stride2", "2", "Stride of the second convolution."),
            ArgSpec::int("padding2", "0", "Padding of the second convolution."),
            ArgSpec::int("dilation2", "1", "Dilation of the second convolution."),
            ArgSpec::int("pool_kernel2", "2", "Kernel size of the second max pool."),
            ArgSpec::int("pool_stride2", "2", "Stride of the second max pool."),
            ArgSpec::int("linear_layer_len1", "50", "Width of the first linear layer."),
            ArgSpec::int("linear_layer_len2", "10", "Width of the second linear layer."),
        ]
    }

    pub fn from_hparams(hp: &HParams) -> Result<Self> {
        let io = IoShape {
            num_features: hp.get_usize("num_features")?,
            seq_len:      hp.get_usize("seq_len")?,
            target_len:   hp.get_usize("target_len")?,
        };
        let dropout = hp.get_f64("dropout")?;
        if !(0.0..=1.0).contains(&dropout) {
            return Err(BodaError::HparamType { key: "dropout".into(), expected: "probability in [0, 1]" });
        }

        let conv1 = WindowGeometry::conv(
            hp.get_usize("kernel_size1")?,
            hp.get_usize("stride1")?,
            hp.get_usize("padding1")?,
            hp.get_usize("dilation1")?,
        );
        let pool1 = WindowGeometry::pool(hp.get_usize("pool_kernel1")?, hp.get_usize("pool_stride1")?);
        let conv2 = WindowGeometry::conv(
            hp.get_usize("kernel_size2")?,
            hp.get_usize("stride2")?,
            hp.get_usize("padding2")?,
            hp.get_usize("dilation2")?,
        );
        let pool2 = WindowGeometry::pool(hp.get_usize("pool_kernel2")?, hp.get_usize("pool_stride2")?);

        let stage_lens = derive_chain(
            io.seq_len,
            &[("conv1", conv1), ("pool1", pool1), ("conv2", conv2), ("pool2", pool2)],
        )?;

        let config = Self {
            io,
            dropout,
            num_channels1:     hp.get_usize("num_channels1")?,
            conv1,
            pool1,
            num_channels2:     hp.get_usize("num_channels2")?,
            conv2,
            pool2,
            linear_layer_len1: hp.get_usize("linear_layer_len1")?,
            linear_layer_len2: hp.get_usize("linear_layer_len2")?,
            optimizer:         OptimizerSpec::from_hparams(hp)?,
            stage_lens,
        };

        let widths = [
            ("num_features", config.io.num_features),
            ("target_len", config.io.target_len),
            ("num_channels1", config.num_channels1),
            ("num_channels2", config.num_channels2),
            ("linear_layer_len1", config.linear_layer_len1),
            ("linear_layer_len2", config.linear_layer_len2),
        ];
        if let Some((key, _)) = widths.iter().find(|(_, w)| *w == 0) {
            return Err(BodaError::HparamType { key: key.to_string(), expected: "positive integer" });
        }

        Ok(config)
    }

    /// Input width of the first linear layer
    pub fn flattened_len(&self) -> usize {
        self.stage_lens[3] * self.num_channels2
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> MpraRegressionModel<B> {
        tracing::info!(
            "{}: seq_len {} → conv1 {} → pool1 {} → conv2 {} → pool2 {} → flatten {}",
            MODEL_NAME,
            self.io.seq_len,
            self.stage_lens[0],
            self.stage_lens[1],
            self.stage_lens[2],
            self.stage_lens[3],
            self.flattened_len(),
        );

        let conv1 = Conv1dConfig::new(self.io.num_features, self.num_channels1, self.conv1.kernel_size)
            .with_stride(self.conv1.stride)
            .with_padding(PaddingConfig1d::Explicit(self.conv1.padding))
            .with_dilation(self.conv1.dilation)
            .init(device);
        let pool1 = MaxPool1dConfig::new(self.pool1.kernel_size)
            .with_stride(self.pool1.stride)
            .init();
        let conv2 = Conv1dConfig::new(self.num_channels1, self.num_channels2, self.conv2.kernel_size)
            .with_stride(self.conv2.stride)
            .with_padding(PaddingConfig1d::Explicit(self.conv2.padding))
            .with_dilation(self.conv2.dilation)
            .init(device);
        let pool2 = MaxPool1dConfig::new(self.pool2.kernel_size)
            .with_stride(self.pool2.stride)
            .init();

        MpraRegressionModel {
            conv1,
            pool1,
            conv2,
            pool2,
            dropout1: DropoutConfig::new(self.dropout).init(),
            fc1:      LinearConfig::new(self.flattened_len(), self.linear_layer_len1).init(device),
            dropout2: DropoutConfig::new(self.dropout).init(),
            fc2:      LinearConfig::new(self.linear_layer_len1, self.linear_layer_len2).init(device),
            dropout3: DropoutConfig::new(0.5 * self.dropout).init(),
            fc3:      LinearConfig::new(self.linear_layer_len2, self.io.target_len).init(device),
            num_features: self.io.num_features,
            seq_len:      self.io.seq_len,
            target_len:   self.io.target_len,
        }
    }
}

#[derive(Module, Debug)]
pub struct MpraRegressionModel<B: Backend> {
    pub conv1:        Conv1d<B>,
    pub pool1:        MaxPool1d,
    pub conv2:        Conv1d<B>,
    pub pool2:        MaxPool1d,
    pub dropout1:     Dropout,
    pub fc1:          Linear<B>,
    pub dropout2:     Dropout,
    pub fc2:          Linear<B>,
    pub dropout3:     Dropout,
    pub fc3:          Linear<B>,
    pub num_features: usize,
    pub seq_len:      usize,
    pub target_len:   usize,
}

impl<B: Backend> RegressionModel<B> for MpraRegressionModel<B> {
    fn io_shape(&self) -> IoShape {
        IoShape {
            num_features: self.num_features,
            seq_len:      self.seq_len,
            target_len:   self.target_len,
        }
    }

    fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.pool1.forward(tanh(self.conv1.forward(inputs)));
        let x = self.pool2.forward(tanh(self.conv2.forward(x)));

        // [batch, channels, len] → [batch, channels * len]
        let x: Tensor<B, 2> = x.flatten(1, 2);

        let x = tanh(self.fc1.forward(self.dropout1.forward(x)));
        let x = tanh(self.fc2.forward(self.dropout2.forward(x)));
        self.fc3.forward(self.dropout3.forward(x))
    }
}

// ─── Registry Hooks ───────────────────────────────────────────────────────────

/// Build from hyperparameters (optionally warm-started) and train
pub fn fit(req: FitRequest<'_>) -> Result<FitOutcome> {
    let config = MpraRegressionConfig::from_hparams(req.model_hparams)?;
    let mut module = config.init::<TrainBackend>(req.device);
    if let Some(path) = req.pretrained {
        module = load_pretrained(module, MODEL_NAME, path, req.device)?;
    }

    let built = BuiltModel {
        name:      MODEL_NAME,
        module,
        hparams:   req.model_hparams.clone(),
        optimizer: config.optimizer,
    };
    fit_with_graph(built, req)
}

/// Rebuild from a checkpoint's hyperparameters and weight bytes
pub fn restore(hp: &HParams, weights: Vec<u8>, device: &Device) -> Result<Box<dyn Predictor>> {
    let config = MpraRegressionConfig::from_hparams(hp)?;
    let module = decode_weights::<InferBackend, _>(config.init::<InferBackend>(device), weights, device)?;
    Ok(Box::new(module))
}
