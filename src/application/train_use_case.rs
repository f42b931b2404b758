// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Resolve data / model / graph modules   (registries)
//   Step 2: Extract each module's hyperparameters  (ArgSpec schemas)
//   Step 3: Build and set up the data module       (Layer 4 - data)
//   Step 4: Build, compose and train the model     (Layer 5 - ml)
//   Step 5: Save the checkpoint record             (Layer 6 - infra)
//   Step 6: Package the run directory              (Layer 6 - infra)
//   Step 7: Deposit the archive                    (Layer 6 - infra)

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::application::registry::{Registries, RegistryEntry};
use crate::domain::args::{ArgKind, ArgSpec, ParsedArgs};
use crate::domain::hparams::HParams;
use crate::infra::{
    artifact::{archive_name, deposit, package},
    checkpoint::{CheckpointRecord, RunStamp},
    metrics::MetricsLogger,
};
use crate::ml::trainer::{FitRequest, TrainReport, TrainerSettings};
use crate::ml::Device;

// ─── Flags owned by the harness itself ────────────────────────────────────────

pub const DATA_MODULE_FLAG:  &str = "data_module";
pub const MODEL_MODULE_FLAG: &str = "model_module";
pub const GRAPH_MODULE_FLAG: &str = "graph_module";

/// Module selection and artifact destination
pub fn main_schema() -> Vec<ArgSpec> {
    vec![
        ArgSpec::required(DATA_MODULE_FLAG, ArgKind::Str, "Data module to train on."),
        ArgSpec::required(MODEL_MODULE_FLAG, ArgKind::Str, "Model architecture to train."),
        ArgSpec::required(GRAPH_MODULE_FLAG, ArgKind::Str, "Training graph driving the loop."),
        ArgSpec::string("artifact_path", "/opt/ml/checkpoints/", "Where the packaged artifact is deposited (local dir, gs:// or s3://)."),
        ArgSpec::optional("pretrained_weights", ArgKind::Str, "Checkpoint file to warm-start the model from."),
        ArgSpec::boolean("tolerate_unknown_args", "false", "Drop unrecognised flags instead of failing."),
    ]
}

/// Run-level trainer settings
pub fn trainer_schema() -> Vec<ArgSpec> {
    vec![
        ArgSpec::string("default_root_dir", "/tmp/output/artifacts", "Working directory packaged into the artifact."),
        ArgSpec::string("staging_dir", "/tmp/output", "Where the archive is written before it is deposited."),
        ArgSpec::int("max_epochs", "10", "Upper bound on training epochs."),
        ArgSpec::int("seed", "42", "Backend and shuffle seed."),
        ArgSpec::int("num_workers", "1", "Data loader worker threads."),
    ]
}

// ─── TrainRequest ─────────────────────────────────────────────────────────────

/// A fully parsed `train` invocation
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub data_module:        String,
    pub model_module:       String,
    pub graph_module:       String,
    pub artifact_path:      String,
    pub pretrained_weights: Option<PathBuf>,
    pub default_root_dir:   PathBuf,
    pub staging_dir:        PathBuf,
    pub trainer:            TrainerSettings,
    /// Every parsed value, module flags included
    pub parsed:             ParsedArgs,
}

impl TrainRequest {
    pub fn from_parsed(parsed: ParsedArgs) -> Result<Self> {
        let main    = parsed.extract(&main_schema())?;
        let trainer = parsed.extract(&trainer_schema())?;

        let pretrained_weights = if main.contains("pretrained_weights") {
            Some(PathBuf::from(main.get_str("pretrained_weights")?))
        } else {
            None
        };

        let settings = TrainerSettings {
            max_epochs:  trainer.get_usize("max_epochs")?,
            seed:        trainer.get_usize("seed")? as u64,
            num_workers: trainer.get_usize("num_workers")?.max(1),
        };
        if settings.max_epochs == 0 {
            bail!("--max_epochs must be at least 1");
        }

        Ok(Self {
            data_module:        main.get_str(DATA_MODULE_FLAG)?.to_string(),
            model_module:       main.get_str(MODEL_MODULE_FLAG)?.to_string(),
            graph_module:       main.get_str(GRAPH_MODULE_FLAG)?.to_string(),
            artifact_path:      main.get_str("artifact_path")?.to_string(),
            pretrained_weights,
            default_root_dir:   PathBuf::from(trainer.get_str("default_root_dir")?),
            staging_dir:        PathBuf::from(trainer.get_str("staging_dir")?),
            trainer:            settings,
            parsed,
        })
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub composed_name: String,
    pub checkpoint:    PathBuf,
    pub archive:       PathBuf,
    pub deposited:     String,
    pub report:        TrainReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────

pub struct TrainUseCase {
    registries: Registries,
    request:    TrainRequest,
}

impl TrainUseCase {
    pub fn new(registries: Registries, request: TrainRequest) -> Self {
        Self { registries, request }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let req = &self.request;
        if req.staging_dir.starts_with(&req.default_root_dir) {
            bail!(
                "--staging_dir '{}' must lie outside --default_root_dir '{}'",
                req.staging_dir.display(),
                req.default_root_dir.display()
            );
        }

        // ── Step 1: Resolve modules ───────────────────────────────────────────
        let data_entry  = self.registries.data.lookup(&req.data_module)?;
        let model_entry = self.registries.model.lookup(&req.model_module)?;
        let graph_entry = self.registries.graph.lookup(&req.graph_module)?;
        tracing::info!(
            "Modules: data={} model={} graph={}",
            data_entry.name(),
            model_entry.name(),
            graph_entry.name()
        );

        // ── Step 2: Per-module hyperparameters ────────────────────────────────
        let data_hparams = data_entry
            .process_args(&req.parsed)
            .with_context(|| format!("Invalid arguments for data module '{}'", data_entry.name()))?;
        let model_hparams = model_entry
            .process_args(&req.parsed)
            .with_context(|| format!("Invalid arguments for model module '{}'", model_entry.name()))?;
        let graph_hparams = graph_entry
            .process_args(&req.parsed)
            .with_context(|| format!("Invalid arguments for graph module '{}'", graph_entry.name()))?;
        warn_shared_keys(&[
            (data_entry.name(), &data_hparams),
            (model_entry.name(), &model_hparams),
            (graph_entry.name(), &graph_hparams),
        ]);

        // ── Step 3: Data ──────────────────────────────────────────────────────
        let mut data = (data_entry.build)(&data_hparams)?;
        data.setup()
            .with_context(|| format!("Failed to set up data module '{}'", data.name()))?;
        tracing::info!(
            "Data splits: train={} val={} test={}",
            data.train_set().sample_count(),
            data.val_set().sample_count(),
            data.test_set().sample_count(),
        );

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&req.default_root_dir)?;
        let graph   = (graph_entry.build)(&graph_hparams)?;
        let device  = Device::default();

        let outcome = (model_entry.fit)(FitRequest {
            model_hparams: &model_hparams,
            graph,
            data:          data.as_ref(),
            settings:      &req.trainer,
            metrics:       &metrics,
            pretrained:    req.pretrained_weights.as_deref(),
            device:        &device,
        })
        .with_context(|| format!("Training {} failed", model_entry.name()))?;

        // ── Step 5: Checkpoint ────────────────────────────────────────────────
        let stamp = RunStamp::now();
        let record = CheckpointRecord {
            data_module:      data_entry.name().to_string(),
            data_hparams,
            model_module:     model_entry.name().to_string(),
            model_hparams,
            graph_module:     graph_entry.name().to_string(),
            graph_hparams,
            model_state_dict: outcome.weights,
            timestamp:        stamp.timestamp.clone(),
            random_tag:       stamp.random_tag,
        };
        let checkpoint = record.save(&req.default_root_dir)?;
        tracing::info!("Checkpoint saved to '{}'", checkpoint.display());

        // ── Step 6 + 7: Package and deposit ───────────────────────────────────
        let archive = package(&req.default_root_dir, &req.staging_dir, &archive_name(&stamp))?;
        let deposited = deposit(&archive, &req.artifact_path)
            .with_context(|| format!("Could not deposit artifact to '{}'", req.artifact_path))?;

        Ok(TrainSummary {
            composed_name: outcome.composed_name,
            checkpoint,
            archive,
            deposited,
            report: outcome.report,
        })
    }
}

/// Flags declared by more than one module share a single value
fn warn_shared_keys(records: &[(&str, &HParams)]) {
    for (i, (name_a, a)) in records.iter().enumerate() {
        for (name_b, b) in &records[i + 1..] {
            for key in a.overlapping_keys(b) {
                tracing::warn!("Flag '--{}' is shared by {} and {}", key, name_a, name_b);
            }
        }
    }
}
