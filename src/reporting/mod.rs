//! Process-wide training report state
//!
//! Holds the summary of the last successfully trained dataset and the
//! metrics of each model kind. Nothing here survives a restart.

use crate::preprocessing::DatasetSummary;
use crate::training::{MetricsRecord, ModelKind, TrainingOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest metrics for both kinds, zeroed when a kind has not been trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastModelMetrics {
    pub logreg: MetricsRecord,
    pub tree: MetricsRecord,
}

/// Body of the summary report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: DatasetSummary,
    pub last_model_metrics: LastModelMetrics,
}

#[derive(Debug, Clone, Default)]
pub struct ReportState {
    summary: Option<DatasetSummary>,
    metrics: BTreeMap<ModelKind, MetricsRecord>,
}

impl ReportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the summary and every metrics record from one training run
    pub fn record(&mut self, outcome: &TrainingOutcome) {
        self.summary = Some(outcome.summary.clone());
        self.metrics = outcome
            .models
            .iter()
            .map(|(model, metrics)| (model.kind(), metrics.clone()))
            .collect();
    }

    pub fn is_trained(&self) -> bool {
        self.summary.is_some()
    }

    pub fn metrics(&self, kind: ModelKind) -> MetricsRecord {
        self.metrics
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| MetricsRecord::zeroed(kind))
    }

    pub fn summary_report(&self) -> SummaryReport {
        SummaryReport {
            summary: self.summary.clone().unwrap_or_default(),
            last_model_metrics: LastModelMetrics {
                logreg: self.metrics(ModelKind::Logreg),
                tree: self.metrics(ModelKind::Tree),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::TrainedModel;

    #[test]
    fn test_empty_report_is_zeroed() {
        let report = ReportState::new().summary_report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["rows"], 0);
        assert_eq!(json["defaultRate"], 0.0);
        assert_eq!(json["lastModelMetrics"]["logreg"]["model"], "logreg");
        assert_eq!(json["lastModelMetrics"]["tree"]["model"], "tree");
        assert_eq!(json["lastModelMetrics"]["tree"]["accuracy"], 0.0);
    }

    #[test]
    fn test_record_replaces_state() {
        let mut state = ReportState::new();
        let mut metrics = MetricsRecord::zeroed(ModelKind::Tree);
        metrics.accuracy = 0.8;

        let outcome = TrainingOutcome {
            summary: DatasetSummary { rows: 10, defaults: 3, non_defaults: 7, ..Default::default() },
            models: vec![(TrainedModel::untrained(ModelKind::Tree), metrics.clone())],
        };
        state.record(&outcome);

        assert!(state.is_trained());
        let report = state.summary_report();
        assert_eq!(report.summary.rows, 10);
        assert_eq!(report.last_model_metrics.tree, metrics);
        assert_eq!(report.last_model_metrics.logreg, MetricsRecord::zeroed(ModelKind::Logreg));
    }
}
