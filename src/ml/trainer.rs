// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Drives a ComposedModule over a DataModule's splits:
//
//   per epoch: graph.training_step → backward → optimizer step
//              graph.validation_step on model.valid() (no dropout)
//              metrics row, graph.should_stop check
//   after:     graph.test_step over the test split
//
// Training runs on TrainBackend (autodiff); validation and test
// run on its inner InferBackend.

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
};
use std::path::Path;

use crate::data::{batcher::MpraBatcher, dataset::MpraDataset, DataModule};
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;
use crate::infra::checkpoint::{decode_weights, encode_weights, CheckpointRecord};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::composer::{BuiltModel, ComposedModule};
use crate::ml::graph::GraphKind;
use crate::ml::optimizer::OptimizerKind;
use crate::ml::traits::{RegressionModel, TrainingGraph};
use crate::ml::{Device, InferBackend, TrainBackend};

/// Run-level settings that belong to no single module
#[derive(Debug, Clone)]
pub struct TrainerSettings {
    pub max_epochs:  usize,
    pub seed:        u64,
    pub num_workers: usize,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self { max_epochs: 10, seed: 42, num_workers: 1 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    pub history:   Vec<EpochMetrics>,
    pub test_loss: Option<f64>,
}

impl TrainReport {
    pub fn epochs_run(&self) -> usize {
        self.history.len()
    }
}

/// Everything a model entry needs to train itself
pub struct FitRequest<'a> {
    pub model_hparams: &'a HParams,
    pub graph:         GraphKind,
    pub data:          &'a dyn DataModule,
    pub settings:      &'a TrainerSettings,
    pub metrics:       &'a MetricsLogger,
    pub pretrained:    Option<&'a Path>,
    pub device:        &'a Device,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub composed_name: String,
    pub weights:       Vec<u8>,
    pub report:        TrainReport,
}

/// Load weights from an earlier checkpoint into a freshly built model
pub fn load_pretrained<M>(module: M, model_name: &str, path: &Path, device: &Device) -> Result<M>
where
    M: Module<TrainBackend>,
{
    let record = CheckpointRecord::load_file(path)?;
    if record.model_module != model_name {
        return Err(BodaError::ShapeMismatch(format!(
            "pretrained weights at '{}' belong to '{}', not '{}'",
            path.display(),
            record.model_module,
            model_name
        )));
    }
    tracing::info!("Loading pretrained weights from '{}' ({})", path.display(), record.timestamp);
    decode_weights::<TrainBackend, M>(module, record.model_state_dict, device)
}

/// Compose with whichever graph was selected, train, and encode the weights
pub fn fit_with_graph<M>(built: BuiltModel<M>, req: FitRequest<'_>) -> Result<FitOutcome>
where
    M: RegressionModel<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: RegressionModel<InferBackend>,
{
    check_data_shape(&built.module, req.data)?;

    match req.graph {
        GraphKind::Basic(graph) => {
            run_composed(ComposedModule::compose(built, graph), req.data, req.settings, req.metrics, req.device)
        }
        GraphKind::EarlyStopping(graph) => {
            run_composed(ComposedModule::compose(built, graph), req.data, req.settings, req.metrics, req.device)
        }
    }
}

fn run_composed<M, G>(
    composed: ComposedModule<M, G>,
    data:     &dyn DataModule,
    settings: &TrainerSettings,
    metrics:  &MetricsLogger,
    device:   &Device,
) -> Result<FitOutcome>
where
    M: RegressionModel<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: RegressionModel<InferBackend>,
    G: TrainingGraph,
{
    let composed_name = composed.composed_name();
    let (composed, report) = fit(composed, data, settings, metrics, device)?;
    let weights = encode_weights::<InferBackend, _>(composed.into_model().valid())?;
    Ok(FitOutcome { composed_name, weights, report })
}

fn check_data_shape<M: RegressionModel<TrainBackend>>(model: &M, data: &dyn DataModule) -> Result<()> {
    let io = model.io_shape();
    let Some((features, seq_len, targets)) = data.train_set().sample_shape() else {
        return Err(BodaError::Data("training split is empty".into()));
    };
    if (features, seq_len, targets) != (io.num_features, io.seq_len, io.target_len) {
        return Err(BodaError::ShapeMismatch(format!(
            "data samples are {features}x{seq_len} → {targets}, model expects {}x{} → {}",
            io.num_features, io.seq_len, io.target_len
        )));
    }
    Ok(())
}

/// Train a composed module with the optimizer its model selected
pub fn fit<M, G>(
    composed: ComposedModule<M, G>,
    data:     &dyn DataModule,
    settings: &TrainerSettings,
    metrics:  &MetricsLogger,
    device:   &Device,
) -> Result<(ComposedModule<M, G>, TrainReport)>
where
    M: RegressionModel<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: RegressionModel<InferBackend>,
    G: TrainingGraph,
{
    TrainBackend::seed(settings.seed);

    match composed.optimizer().kind {
        OptimizerKind::Adam => {
            let optim = composed.optimizer().adam_config().init::<TrainBackend, M>();
            train_loop(composed, optim, data, settings, metrics, device)
        }
        OptimizerKind::RmsProp => {
            let optim = composed.optimizer().rms_prop_config().init::<TrainBackend, M>();
            train_loop(composed, optim, data, settings, metrics, device)
        }
    }
}

fn train_loop<M, G, O>(
    mut composed: ComposedModule<M, G>,
    mut optim:    O,
    data:         &dyn DataModule,
    settings:     &TrainerSettings,
    metrics:      &MetricsLogger,
    device:       &Device,
) -> Result<(ComposedModule<M, G>, TrainReport)>
where
    M: RegressionModel<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: RegressionModel<InferBackend>,
    G: TrainingGraph,
    O: Optimizer<M, TrainBackend>,
{
    let lr = composed.optimizer().lr;

    let train_loader = DataLoaderBuilder::new(MpraBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(data.batch_size())
        .shuffle(settings.seed)
        .num_workers(settings.num_workers)
        .build(data.train_set());

    let val_set = data.val_set();
    let has_val = val_set.sample_count() > 0;
    let val_loader = DataLoaderBuilder::new(MpraBatcher::<InferBackend>::new(device.clone()))
        .batch_size(data.batch_size())
        .num_workers(settings.num_workers)
        .build(val_set);

    let mut report = TrainReport::default();

    for epoch in 1..=settings.max_epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = composed.graph.training_step(&composed.model, batch);
            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &composed.model);
            composed.model = optim.step(lr, composed.model, grads);
        }

        let train_loss = mean(train_loss_sum, train_batches);

        // ── Validation phase ──────────────────────────────────────────────────
        let val_loss = if has_val && composed.graph.should_validate(epoch) {
            let model_valid = composed.model.valid();
            let mut sum = 0.0f64;
            let mut batches = 0usize;
            for batch in val_loader.iter() {
                sum += composed
                    .graph
                    .validation_step(&model_valid, batch)
                    .into_scalar()
                    .elem::<f64>();
                batches += 1;
            }
            mean(sum, batches)
        } else {
            f64::NAN
        };

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
            epoch, settings.max_epochs, train_loss, val_loss,
        );

        let row = EpochMetrics::new(epoch, train_loss, val_loss);
        metrics.log(&row)?;
        report.history.push(row);

        if composed.graph.should_stop(&report.history) {
            break;
        }
    }

    // ── Test phase ────────────────────────────────────────────────────────────
    report.test_loss = evaluate(&composed, data.test_set(), data.batch_size(), settings, device);
    if let Some(test_loss) = report.test_loss {
        tracing::info!("test_loss={:.4}", test_loss);
    }

    tracing::info!("Training complete after {} epochs", report.epochs_run());
    Ok((composed, report))
}

/// Mean test-step loss, None for an empty split
fn evaluate<M, G>(
    composed:   &ComposedModule<M, G>,
    test_set:   MpraDataset,
    batch_size: usize,
    settings:   &TrainerSettings,
    device:     &Device,
) -> Option<f64>
where
    M: RegressionModel<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: RegressionModel<InferBackend>,
    G: TrainingGraph,
{
    if test_set.sample_count() == 0 {
        return None;
    }
    let loader = DataLoaderBuilder::new(MpraBatcher::<InferBackend>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(settings.num_workers)
        .build(test_set);

    let model_valid = composed.model().valid();
    let mut sum = 0.0f64;
    let mut batches = 0usize;
    for batch in loader.iter() {
        sum += composed.graph().test_step(&model_valid, batch).into_scalar().elem::<f64>();
        batches += 1;
    }
    Some(mean(sum, batches))
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}
