// ============================================================
// Layer 2 — Module Registries
// ============================================================
// The CLI names modules by string; a registry maps each name to
// an entry that knows the module's flags and how to build it.
//
//   data  registry → MpraTsv, SyntheticMpra
//   model registry → MpraRegression
//   graph registry → BasicRegression, EarlyStopping
//
// A name that is not registered is an explicit UnknownModule
// error listing what is available.

use crate::data::modules::{MpraTsvData, SyntheticMpraData};
use crate::data::DataModule;
use crate::domain::args::{ArgSpec, ParsedArgs};
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;
use crate::ml::graph::{BasicRegressionGraph, EarlyStoppingGraph, GraphKind};
use crate::ml::model::{self, MpraRegressionConfig, MODEL_NAME};
use crate::ml::trainer::{FitOutcome, FitRequest};
use crate::ml::traits::Predictor;
use crate::ml::Device;

/// Anything a registry can hold
pub trait RegistryEntry {
    fn name(&self) -> &'static str;

    fn schema(&self) -> Vec<ArgSpec>;

    /// Pull this module's own values out of the full parse
    fn process_args(&self, parsed: &ParsedArgs) -> Result<HParams> {
        parsed.extract(&self.schema())
    }
}

// ─── Entries ──────────────────────────────────────────────────────────────────

pub struct DataEntry {
    pub name:   &'static str,
    pub schema: fn() -> Vec<ArgSpec>,
    pub build:  fn(&HParams) -> Result<Box<dyn DataModule>>,
}

pub struct ModelEntry {
    pub name:     &'static str,
    pub schema:   fn() -> Vec<ArgSpec>,
    /// Rejects records the model could never be built from
    pub validate: fn(&HParams) -> Result<()>,
    pub fit:      fn(FitRequest<'_>) -> Result<FitOutcome>,
    pub restore:  fn(&HParams, Vec<u8>, &Device) -> Result<Box<dyn Predictor>>,
}

pub struct GraphEntry {
    pub name:   &'static str,
    pub schema: fn() -> Vec<ArgSpec>,
    pub build:  fn(&HParams) -> Result<GraphKind>,
}

impl RegistryEntry for DataEntry {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> Vec<ArgSpec> {
        (self.schema)()
    }
}

impl RegistryEntry for ModelEntry {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> Vec<ArgSpec> {
        (self.schema)()
    }

    fn process_args(&self, parsed: &ParsedArgs) -> Result<HParams> {
        let hparams = parsed.extract(&self.schema())?;
        (self.validate)(&hparams)?;
        Ok(hparams)
    }
}

impl RegistryEntry for GraphEntry {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> Vec<ArgSpec> {
        (self.schema)()
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct Registry<E> {
    kind:    &'static str,
    entries: Vec<E>,
}

impl<E: RegistryEntry> Registry<E> {
    pub fn new(kind: &'static str, entries: Vec<E>) -> Self {
        Self { kind, entries }
    }

    pub fn lookup(&self, name: &str) -> Result<&E> {
        self.entries
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| BodaError::UnknownModule {
                registry:  self.kind,
                name:      name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(RegistryEntry::name).collect()
    }
}

/// The three registries the harness resolves modules through
pub struct Registries {
    pub data:  Registry<DataEntry>,
    pub model: Registry<ModelEntry>,
    pub graph: Registry<GraphEntry>,
}

impl Registries {
    pub fn standard() -> Self {
        Self {
            data: Registry::new("data", vec![
                DataEntry {
                    name:   MpraTsvData::NAME,
                    schema: MpraTsvData::schema,
                    build:  |hp| Ok(Box::new(MpraTsvData::from_hparams(hp)?)),
                },
                DataEntry {
                    name:   SyntheticMpraData::NAME,
                    schema: SyntheticMpraData::schema,
                    build:  |hp| Ok(Box::new(SyntheticMpraData::from_hparams(hp)?)),
                },
            ]),
            model: Registry::new("model", vec![ModelEntry {
                name:     MODEL_NAME,
                schema:   MpraRegressionConfig::schema,
                validate: |hp| MpraRegressionConfig::from_hparams(hp).map(|_| ()),
                fit:      model::fit,
                restore:  model::restore,
            }]),
            graph: Registry::new("graph", vec![
                GraphEntry {
                    name:   BasicRegressionGraph::NAME,
                    schema: BasicRegressionGraph::schema,
                    build:  |hp| Ok(GraphKind::Basic(BasicRegressionGraph::from_hparams(hp)?)),
                },
                GraphEntry {
                    name:   EarlyStoppingGraph::NAME,
                    schema: EarlyStoppingGraph::schema,
                    build:  |hp| Ok(GraphKind::EarlyStopping(EarlyStoppingGraph::from_hparams(hp)?)),
                },
            ]),
        }
    }
}
