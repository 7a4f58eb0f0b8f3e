//! Inference engine implementation

use super::{FeatureVector, InferenceConfig};
use crate::error::Result;
use crate::store::ModelStore;
use crate::training::{Classifier, ModelKind, TrainedModel};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Static note attached to every prediction
pub const EXPLANATION_NOTE: &str = "For full explanations, compute SHAP on the server model.";

/// Echo of the inputs behind a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub features: FeatureVector,
    pub threshold: f64,
    pub note: String,
}

/// Result of scoring one applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub model: ModelKind,
    pub prob: f64,
    pub label: u8,
    pub explanation: Explanation,
}

/// Scores single applicants against models in the store.
///
/// Models are read from disk on every call, so a retrain is picked up by
/// the next prediction without any reload step.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    store: ModelStore,
}

impl InferenceEngine {
    pub fn new(store: ModelStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Load the configured model and score `features`
    pub fn predict(&self, features: &FeatureVector, config: &InferenceConfig) -> Result<Prediction> {
        let start = Instant::now();
        let model = self.store.load(config.model)?;
        let prediction = Self::predict_with(&model, features, config.classification_threshold)?;

        debug!(
            model = %config.model,
            prob = prediction.prob,
            label = prediction.label,
            latency_us = start.elapsed().as_micros() as u64,
            "Prediction served"
        );
        Ok(prediction)
    }

    /// Score `features` with an already loaded model
    pub fn predict_with(model: &TrainedModel, features: &FeatureVector, threshold: f64) -> Result<Prediction> {
        let proba = model.predict_proba(&features.to_row())?;
        let prob = proba.get(0).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        let label = u8::from(prob >= threshold);

        Ok(Prediction {
            model: model.kind(),
            prob,
            label,
            explanation: Explanation {
                features: *features,
                threshold,
                note: EXPLANATION_NOTE.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoanError;
    use ndarray::{Array1, Array2};
    use tempfile::TempDir;

    fn trained_store(dir: &TempDir) -> ModelStore {
        let store = ModelStore::open(dir.path()).unwrap();
        let x = Array2::from_shape_fn((40, 4), |(i, j)| if j == 3 { 500.0 + (i * 10) as f64 } else { (i % 5) as f64 });
        let y = Array1::from_shape_fn(40, |i| if i < 15 { 1.0 } else { 0.0 });

        for kind in ModelKind::ALL {
            let mut model = TrainedModel::untrained(kind);
            model.fit(&x, &y).unwrap();
            store.save(&model).unwrap();
        }
        store
    }

    #[test]
    fn test_predict_untrained_model() {
        let dir = TempDir::new().unwrap();
        let engine = InferenceEngine::new(ModelStore::open(dir.path()).unwrap());

        let result = engine.predict(&FeatureVector::default(), &InferenceConfig::default());
        assert!(matches!(result, Err(LoanError::ModelNotTrained(ModelKind::Logreg))));
    }

    #[test]
    fn test_label_follows_threshold() {
        let dir = TempDir::new().unwrap();
        let engine = InferenceEngine::new(trained_store(&dir));
        let features = FeatureVector::new(35.0, 2.0, 1.0, 620.0);

        for kind in ModelKind::ALL {
            for threshold in [0.1, 0.5, 0.9] {
                let config = InferenceConfig::new(kind, threshold).unwrap();
                let p = engine.predict(&features, &config).unwrap();
                assert_eq!(p.model, kind);
                assert!((0.0..=1.0).contains(&p.prob));
                assert_eq!(p.label == 1, p.prob >= threshold);
                assert_eq!(p.explanation.threshold, threshold);
            }
        }
    }

    #[test]
    fn test_explanation_echoes_inputs() {
        let dir = TempDir::new().unwrap();
        let engine = InferenceEngine::new(trained_store(&dir));
        let features = FeatureVector::new(35.0, 50000.0, 15000.0, 680.0);

        let p = engine.predict(&features, &InferenceConfig::default()).unwrap();
        assert_eq!(p.explanation.features, features);
        assert_eq!(p.explanation.note, EXPLANATION_NOTE);

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["model"], "logreg");
        assert_eq!(json["explanation"]["features"]["CreditScore"], 680.0);
    }
}
