//! Aggregate statistics over a validated dataset

use super::dataset::{LoanDataset, CREDIT_SCORE_IDX, INCOME_IDX, LOAN_AMOUNT_IDX};
use serde::{Deserialize, Serialize};

/// Dataset summary reported by `/api/reports/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub rows: usize,
    pub defaults: i64,
    pub non_defaults: i64,
    pub default_rate: f64,
    pub credit_avg: f64,
    pub dti_avg: f64,
}

impl DatasetSummary {
    /// Compute the summary. Empty datasets and datasets without any usable
    /// income produce zeros rather than NaN.
    pub fn build(dataset: &LoanDataset) -> Self {
        let rows = dataset.n_rows();
        let defaults = dataset.target().sum() as i64;
        let x = dataset.features();

        let (credit_avg, dti_avg) = if rows == 0 {
            (0.0, 0.0)
        } else {
            let credit_avg = x.column(CREDIT_SCORE_IDX).sum() / rows as f64;

            // Rows with zero income have no defined ratio and are left out
            let (dti_sum, dti_count) = x
                .rows()
                .into_iter()
                .filter(|row| row[INCOME_IDX] != 0.0)
                .fold((0.0, 0usize), |(sum, count), row| {
                    (sum + row[LOAN_AMOUNT_IDX] / row[INCOME_IDX], count + 1)
                });
            let dti_avg = if dti_count == 0 { 0.0 } else { dti_sum / dti_count as f64 };

            (credit_avg, dti_avg)
        };

        Self {
            rows,
            defaults,
            non_defaults: rows as i64 - defaults,
            default_rate: if rows == 0 { 0.0 } else { defaults as f64 / rows as f64 },
            credit_avg,
            dti_avg,
        }
    }
}
