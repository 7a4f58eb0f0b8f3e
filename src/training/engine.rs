//! Training engine implementation

use super::{Classifier, HoldoutSplitter, MetricsRecord, ModelKind, TrainedModel, TrainingConfig};
use crate::error::Result;
use crate::preprocessing::{DatasetSummary, LoanDataset, FEATURES};
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::{debug, info};

/// Everything a successful training pass produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub summary: DatasetSummary,
    /// One entry per model kind, in `ModelKind::ALL` order
    pub models: Vec<(TrainedModel, MetricsRecord)>,
}

impl TrainingOutcome {
    pub fn metrics(&self) -> Vec<MetricsRecord> {
        self.models.iter().map(|(_, m)| m.clone()).collect()
    }
}

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Split, fit both model kinds and score them on the held-out rows.
    ///
    /// Nothing is persisted here; the caller decides what to do with the
    /// outcome once every model has fitted.
    pub fn fit(&self, dataset: &LoanDataset) -> Result<TrainingOutcome> {
        let start = Instant::now();
        let summary = DatasetSummary::build(dataset);

        let x = dataset.features();
        let y = dataset.labels();

        let split = HoldoutSplitter::new(self.config.test_size)
            .with_random_state(self.config.random_state)
            .split(&y)?;
        let (x_train, x_test, y_train, y_test) = split.apply(x, &y);

        info!(
            rows = dataset.n_rows(),
            train = y_train.len(),
            test = y_test.len(),
            stratified = split.stratified,
            "Split dataset"
        );

        let (logreg, tree) = rayon::join(
            || self.fit_one(ModelKind::Logreg, &x_train, &y_train, &x_test, &y_test),
            || self.fit_one(ModelKind::Tree, &x_train, &y_train, &x_test, &y_test),
        );
        let models = vec![logreg?, tree?];

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training complete"
        );

        Ok(TrainingOutcome { summary, models })
    }

    fn fit_one(
        &self,
        kind: ModelKind,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<(TrainedModel, MetricsRecord)> {
        let mut model = TrainedModel::untrained(kind);
        model.fit(x_train, y_train)?;

        let proba = model.predict_proba(x_test)?;
        let metrics = MetricsRecord::from_probabilities(kind, y_test, &proba, self.config.eval_threshold);

        if let TrainedModel::Tree(tree) = &model {
            if let Some(importances) = tree.feature_importances() {
                let ranked: Vec<String> = FEATURES
                    .iter()
                    .zip(importances.iter())
                    .map(|(name, imp)| format!("{}={:.3}", name, imp))
                    .collect();
                debug!(depth = tree.get_depth(), leaves = tree.get_n_leaves(), importances = %ranked.join(","), "Tree fitted");
            }
        }

        info!(
            model = %kind,
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            "Model evaluated"
        );

        Ok((model, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 100 applicants, every third-ish one with a low credit score defaults
    fn create_test_data() -> LoanDataset {
        let n = 100;
        let x = Array2::from_shape_fn((n, 4), |(i, j)| match j {
            0 => 20.0 + (i % 40) as f64,
            1 => 30_000.0 + (i * 700) as f64,
            2 => 5_000.0 + ((i * 37) % 20) as f64 * 1_000.0,
            _ => if i % 10 < 3 { 520.0 + (i % 7) as f64 * 10.0 } else { 650.0 + (i % 13) as f64 * 10.0 },
        });
        let y = Array1::from_shape_fn(n, |i| if i % 10 < 3 { 1.0 } else { 0.0 });
        LoanDataset::from_arrays(x, y).unwrap()
    }

    #[test]
    fn test_fit_produces_both_models() {
        let engine = TrainEngine::new(TrainingConfig::default());
        let outcome = engine.fit(&create_test_data()).unwrap();

        assert_eq!(outcome.summary.rows, 100);
        assert_eq!(outcome.summary.defaults, 30);

        let kinds: Vec<ModelKind> = outcome.models.iter().map(|(m, _)| m.kind()).collect();
        assert_eq!(kinds, ModelKind::ALL.to_vec());

        for (_, metrics) in &outcome.models {
            assert_eq!(metrics.tp + metrics.tn + metrics.fp + metrics.fn_, 20);
            assert!((0.0..=1.0).contains(&metrics.accuracy));
        }
    }

    #[test]
    fn test_separable_data_scores_well() {
        let engine = TrainEngine::new(TrainingConfig::default());
        let outcome = engine.fit(&create_test_data()).unwrap();

        // credit score alone separates the classes
        for record in outcome.metrics() {
            assert!(record.accuracy >= 0.9, "{} accuracy {}", record.model, record.accuracy);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data = create_test_data();
        let config = TrainingConfig::new(0.3, 7).unwrap();
        let a = TrainEngine::new(config.clone()).fit(&data).unwrap();
        let b = TrainEngine::new(config).fit(&data).unwrap();
        assert_eq!(a.metrics(), b.metrics());
    }

    #[test]
    fn test_single_class_fails() {
        let x = Array2::from_elem((20, 4), 1.0);
        let y = Array1::zeros(20);
        let data = LoanDataset::from_arrays(x, y).unwrap();

        let result = TrainEngine::new(TrainingConfig::default()).fit(&data);
        assert!(result.is_err());
    }
}
