//! Hold-out evaluation metrics

use super::ModelKind;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Evaluation of one model on the held-out partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub model: ModelKind,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl MetricsRecord {
    /// All-zero record reported for a model that has not been trained
    pub fn zeroed(model: ModelKind) -> Self {
        Self {
            model,
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            tp: 0,
            tn: 0,
            fp: 0,
            fn_: 0,
        }
    }

    /// Compare hard labels against ground truth. Zero denominators give 0.0.
    pub fn compute(model: ModelKind, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut record = Self::zeroed(model);

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t == 1.0, *p == 1.0) {
                (true, true) => record.tp += 1,
                (false, true) => record.fp += 1,
                (false, false) => record.tn += 1,
                (true, false) => record.fn_ += 1,
            }
        }

        let (tp, tn, fp, fn_) = (
            record.tp as f64,
            record.tn as f64,
            record.fp as f64,
            record.fn_ as f64,
        );
        let total = tp + tn + fp + fn_;

        record.accuracy = ratio(tp + tn, total);
        record.precision = ratio(tp, tp + fp);
        record.recall = ratio(tp, tp + fn_);
        record.f1 = ratio(2.0 * record.precision * record.recall, record.precision + record.recall);
        record
    }

    /// Threshold probabilities and compute the record
    pub fn from_probabilities(model: ModelKind, y_true: &Array1<f64>, proba: &Array1<f64>, threshold: f64) -> Self {
        let y_pred = proba.mapv(|p| if p >= threshold { 1.0 } else { 0.0 });
        Self::compute(model, y_true, &y_pred)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
