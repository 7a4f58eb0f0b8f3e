//! Model training module
//!
//! Provides the two classifiers the service trains:
//! - Logistic regression behind a standardizing pipeline
//! - Depth-limited decision tree
//!
//! plus the hold-out splitter, evaluation metrics and the engine that runs a
//! full training pass.

mod config;
mod engine;
mod metrics;
pub mod decision_tree;
pub mod linear_models;
pub mod split;

pub use config::{ClassWeight, ModelKind, TrainingConfig, TEST_SIZE_RANGE, TREE_RANDOM_STATE};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{TrainEngine, TrainingOutcome};
pub use linear_models::{LogisticPipeline, LogisticRegression};
pub use metrics::MetricsRecord;
pub use split::{HoldoutSplit, HoldoutSplitter};

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Uniform capability of every model kind
pub trait Classifier {
    /// Fit to training rows and binary labels
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of class 1 for each row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// A fitted model, tagged with its kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "lowercase")]
pub enum TrainedModel {
    Logreg(LogisticPipeline),
    Tree(DecisionTree),
}

impl TrainedModel {
    /// Unfitted model of `kind` with the service's fixed hyperparameters
    pub fn untrained(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Logreg => TrainedModel::Logreg(
                LogisticPipeline::new()
                    .with_classifier(LogisticRegression::new().with_c(1.0).with_max_iter(200))
                    .with_class_weight(ClassWeight::Balanced),
            ),
            ModelKind::Tree => TrainedModel::Tree(
                DecisionTree::new()
                    .with_max_depth(6)
                    .with_min_samples_leaf(10)
                    .with_class_weight(ClassWeight::Balanced)
                    .with_random_state(TREE_RANDOM_STATE),
            ),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Logreg(_) => ModelKind::Logreg,
            TrainedModel::Tree(_) => ModelKind::Tree,
        }
    }
}

impl Classifier for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            TrainedModel::Logreg(m) => m.fit(x, y),
            TrainedModel::Tree(m) => m.fit(x, y),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::Logreg(m) => m.predict_proba(x),
            TrainedModel::Tree(m) => Classifier::predict_proba(m, x),
        }
    }
}

/// Per-sample weights for binary labels.
///
/// `Balanced` gives each present class `n_samples / (n_classes * n_class_samples)`.
pub fn class_weights(y: &Array1<f64>, strategy: ClassWeight) -> Array1<f64> {
    match strategy {
        ClassWeight::Uniform => Array1::ones(y.len()),
        ClassWeight::Balanced => {
            let n = y.len() as f64;
            let n_pos = y.iter().filter(|&&v| v == 1.0).count() as f64;
            let n_neg = n - n_pos;
            let n_classes = (n_pos > 0.0) as u8 as f64 + (n_neg > 0.0) as u8 as f64;

            y.mapv(|v| {
                let count = if v == 1.0 { n_pos } else { n_neg };
                n / (n_classes * count)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_balanced_weights() {
        let y = array![1.0, 0.0, 0.0, 0.0];
        let w = class_weights(&y, ClassWeight::Balanced);
        assert!((w[0] - 2.0).abs() < 1e-12);
        assert!((w[1] - 2.0 / 3.0).abs() < 1e-12);
        // each class carries half of the total weight
        assert!((w.sum() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weights_single_class() {
        let w = class_weights(&array![0.0, 0.0], ClassWeight::Balanced);
        assert_eq!(w.to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_trained_model_serde_tag() {
        let model = TrainedModel::untrained(ModelKind::Tree);
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["kind"], "tree");

        let back: TrainedModel = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ModelKind::Tree);
    }
}
