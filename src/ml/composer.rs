// ============================================================
// Layer 5 — Module Composer
// ============================================================
// Fuses an already-built model with a training graph.
//
// The model instance is moved in untouched, so everything set
// while it was constructed (weights, seq_len, ...) survives. The
// composed hyperparameter view is the model record with the
// graph record applied on top; overlapping keys are logged and
// the graph value wins.

use crate::domain::hparams::HParams;
use crate::ml::optimizer::OptimizerSpec;
use crate::ml::traits::TrainingGraph;

/// A model together with the record and optimizer it was built from
#[derive(Debug, Clone)]
pub struct BuiltModel<M> {
    pub name:      &'static str,
    pub module:    M,
    pub hparams:   HParams,
    pub optimizer: OptimizerSpec,
}

/// One trainable unit: model behaviour plus graph behaviour
#[derive(Debug, Clone)]
pub struct ComposedModule<M, G> {
    pub(crate) model:      M,
    pub(crate) graph:      G,
    model_name:            &'static str,
    optimizer:             OptimizerSpec,
    hparams:               HParams,
}

impl<M, G: TrainingGraph> ComposedModule<M, G> {
    pub fn compose(built: BuiltModel<M>, graph: G) -> Self {
        let mut hparams = built.hparams;
        let collisions = hparams.merge_over(graph.hparams(), graph.name());

        tracing::info!(
            "Composed {} with {} ({} hyperparameters, {} overridden)",
            built.name,
            graph.name(),
            hparams.len(),
            collisions.len(),
        );

        Self {
            model: built.module,
            graph,
            model_name: built.name,
            optimizer: built.optimizer,
            hparams,
        }
    }

    /// e.g. "MpraRegression+EarlyStopping"
    pub fn composed_name(&self) -> String {
        format!("{}+{}", self.model_name, self.graph.name())
    }

    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn optimizer(&self) -> &OptimizerSpec {
        &self.optimizer
    }

    /// Merged hyperparameters
    pub fn hparams(&self) -> &HParams {
        &self.hparams
    }

    pub fn into_model(self) -> M {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::args::ParsedArgs;
    use crate::domain::hparams::HValue;
    use crate::ml::graph::{BasicRegressionGraph, EarlyStoppingGraph};
    use crate::ml::model::{MpraRegressionConfig, MpraRegressionModel, MODEL_NAME};
    use crate::ml::traits::RegressionModel;
    use burn::backend::NdArray;
    use std::any::{Any, TypeId};

    type TestBackend = NdArray<f32>;

    fn built(seq_len: &str) -> BuiltModel<MpraRegressionModel<TestBackend>> {
        let schema = MpraRegressionConfig::schema();
        let hp = ParsedArgs::from_defaults(&schema, &[("seq_len", seq_len)])
            .unwrap()
            .extract(&schema)
            .unwrap();
        let cfg = MpraRegressionConfig::from_hparams(&hp).unwrap();
        BuiltModel {
            name:      MODEL_NAME,
            module:    cfg.init(&Default::default()),
            hparams:   hp,
            optimizer: cfg.optimizer.clone(),
        }
    }

    fn graph_hparams(schema: &[crate::domain::args::ArgSpec], overrides: &[(&str, &str)]) -> HParams {
        ParsedArgs::from_defaults(schema, overrides).unwrap().extract(schema).unwrap()
    }

    fn type_of<T: Any>(_: &T) -> TypeId {
        TypeId::of::<T>()
    }

    #[test]
    fn test_two_graphs_give_two_composed_types() {
        let model = built("300");

        let basic = BasicRegressionGraph::from_hparams(&graph_hparams(&BasicRegressionGraph::schema(), &[]))
            .unwrap();
        let early = EarlyStoppingGraph::from_hparams(&graph_hparams(
            &EarlyStoppingGraph::schema(),
            &[("patience", "3")],
        ))
        .unwrap();

        let a = ComposedModule::compose(model.clone(), basic);
        let b = ComposedModule::compose(model, early);

        assert_ne!(type_of(&a), type_of(&b));
        assert_ne!(a.composed_name(), b.composed_name());

        // model attributes survive on both
        for seq_len in [a.model().io_shape().seq_len, b.model().io_shape().seq_len] {
            assert_eq!(seq_len, 300);
        }
        assert_eq!(a.hparams().get_usize("seq_len").unwrap(), 300);
        assert_eq!(b.hparams().get_usize("seq_len").unwrap(), 300);

        // each gains its own graph's hyperparameters
        assert!(a.hparams().contains("val_every_n_epochs"));
        assert!(!a.hparams().contains("patience"));
        assert_eq!(b.hparams().get_usize("patience").unwrap(), 3);
        assert!(!b.hparams().contains("val_every_n_epochs"));
    }

    #[test]
    fn test_graph_overrides_model_on_collision() {
        let model = built("600");
        // a graph record that happens to redeclare dropout
        let hp = graph_hparams(&EarlyStoppingGraph::schema(), &[])
            .with("dropout", HValue::Float(0.0));
        let graph = EarlyStoppingGraph::from_hparams(&hp).unwrap();

        let composed = ComposedModule::compose(model, graph);
        assert_eq!(composed.hparams().get_f64("dropout").unwrap(), 0.0);
    }

    #[test]
    fn test_optimizer_comes_from_model() {
        let composed = ComposedModule::compose(
            built("600"),
            BasicRegressionGraph::from_hparams(&graph_hparams(&BasicRegressionGraph::schema(), &[]))
                .unwrap(),
        );
        assert_eq!(composed.optimizer().lr, 0.0005);
        assert_eq!(composed.model_name(), MODEL_NAME);
    }
}
