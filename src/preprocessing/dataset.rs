//! CSV ingestion, column validation and numeric coercion for applicant data

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Feature columns, in the order models consume them
pub const FEATURES: [&str; 4] = ["Age", "Income", "LoanAmount", "CreditScore"];

/// Binary target column
pub const TARGET: &str = "Default";

/// Index of each feature inside a row of [`LoanDataset::features`]
pub const INCOME_IDX: usize = 1;
pub const LOAN_AMOUNT_IDX: usize = 2;
pub const CREDIT_SCORE_IDX: usize = 3;

/// Validated applicant dataset.
///
/// Every required column is present and every cell is a finite `f64`;
/// anything that could not be read as a number was replaced with `0.0`.
#[derive(Debug, Clone)]
pub struct LoanDataset {
    features: Array2<f64>,
    target: Array1<f64>,
}

impl LoanDataset {
    /// Parse raw CSV bytes, validate the columns and coerce them.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let df = read_csv(bytes)?;
        Self::from_frame(&df)
    }

    /// Validate and coerce an already parsed frame.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        validate_columns(df)?;

        let n_rows = df.height();
        let mut features = Array2::zeros((n_rows, FEATURES.len()));
        for (j, name) in FEATURES.iter().enumerate() {
            let values = coerce_column(df, name)?;
            for (i, v) in values.into_iter().enumerate() {
                features[[i, j]] = v;
            }
        }
        let target = Array1::from_vec(coerce_column(df, TARGET)?);

        debug!(rows = n_rows, "Coerced required columns to numeric");
        Ok(Self { features, target })
    }

    /// Build a dataset directly from numeric arrays.
    pub fn from_arrays(features: Array2<f64>, target: Array1<f64>) -> Result<Self> {
        if features.ncols() != FEATURES.len() {
            return Err(LoanError::ShapeError {
                expected: format!("{} feature columns", FEATURES.len()),
                actual: format!("{} feature columns", features.ncols()),
            });
        }
        if features.nrows() != target.len() {
            return Err(LoanError::ShapeError {
                expected: format!("target length = {}", features.nrows()),
                actual: format!("target length = {}", target.len()),
            });
        }
        let features = features.mapv(finite_or_zero);
        let target = target.mapv(finite_or_zero);
        Ok(Self { features, target })
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Raw coerced target values
    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }

    /// Target as class labels: integer part non-zero means class 1
    pub fn labels(&self) -> Array1<f64> {
        self.target.mapv(|v| if v.trunc() != 0.0 { 1.0 } else { 0.0 })
    }
}

/// Read CSV bytes with a header row.
///
/// Every column is read as text so that a stray non-numeric cell deep in the
/// file degrades to a zero during coercion instead of failing schema inference.
pub fn read_csv(bytes: &[u8]) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| LoanError::ParseError(e.to_string()))
}

/// Fail with the full list of absent required columns.
pub fn validate_columns(df: &DataFrame) -> Result<()> {
    let missing: Vec<&str> = FEATURES
        .iter()
        .copied()
        .chain(std::iter::once(TARGET))
        .filter(|name| df.column(name).is_err())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing_columns(&missing))
    }
}

/// `Missing columns: ['Income', 'Default']`
fn missing_columns(names: &[&str]) -> LoanError {
    let listed: Vec<String> = names.iter().map(|name| format!("'{}'", name)).collect();
    LoanError::ValidationError(format!("Missing columns: [{}]", listed.join(", ")))
}

/// Parse a single cell permissively. Unparseable, empty or non-finite input is `0.0`.
pub fn coerce_numeric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return finite_or_zero(v);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => 1.0,
        _ => 0.0,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn coerce_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| missing_columns(&[name]))?;
    let series = column.as_materialized_series();

    let values = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|cell| cell.map(coerce_numeric).unwrap_or(0.0))
            .collect(),
        _ => {
            let cast = series.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|cell| cell.map(finite_or_zero).unwrap_or(0.0))
                .collect()
        }
    };

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_CSV: &str = "Age,Income,LoanAmount,CreditScore,Default\n\
        30,40000,10000,700,0\n\
        45,abc,20000,,1\n\
        22,25000,5000,610,True\n";

    #[test]
    fn test_parse_and_coerce() {
        let ds = LoanDataset::from_csv_bytes(GOOD_CSV.as_bytes()).unwrap();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.features()[[0, 0]], 30.0);
        // non-numeric income and empty credit score become zero
        assert_eq!(ds.features()[[1, INCOME_IDX]], 0.0);
        assert_eq!(ds.features()[[1, CREDIT_SCORE_IDX]], 0.0);
        assert_eq!(ds.target().to_vec(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_missing_columns_listed_in_order() {
        let csv = "Age,LoanAmount,CreditScore\n30,1000,700\n";
        let err = LoanDataset::from_csv_bytes(csv.as_bytes()).unwrap_err();
        match err {
            LoanError::ValidationError(msg) => {
                assert_eq!(msg, "Missing columns: ['Income', 'Default']");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let csv = "Age,Income,LoanAmount,CreditScore,Default\n";
        let ds = LoanDataset::from_csv_bytes(csv.as_bytes()).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let csv = "Id,Age,Income,LoanAmount,CreditScore,Default,Notes\n1,30,100,10,700,0,x\n";
        let ds = LoanDataset::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(ds.features().row(0).to_vec(), vec![30.0, 100.0, 10.0, 700.0]);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(" 42.5 "), 42.5);
        assert_eq!(coerce_numeric("1e3"), 1000.0);
        assert_eq!(coerce_numeric("NaN"), 0.0);
        assert_eq!(coerce_numeric("inf"), 0.0);
        assert_eq!(coerce_numeric("FALSE"), 0.0);
        assert_eq!(coerce_numeric("n/a"), 0.0);
    }

    #[test]
    fn test_labels_binarize_target() {
        let ds = LoanDataset::from_arrays(
            Array2::zeros((3, 4)),
            Array1::from_vec(vec![0.0, 1.0, 0.4]),
        )
        .unwrap();
        assert_eq!(ds.labels().to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_from_arrays_shape_mismatch() {
        let result = LoanDataset::from_arrays(Array2::zeros((3, 4)), Array1::zeros(2));
        assert!(matches!(result, Err(LoanError::ShapeError { .. })));
    }
}
