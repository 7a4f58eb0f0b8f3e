//! Data preprocessing module
//!
//! - CSV ingestion with required-column validation and permissive numeric coercion
//! - Dataset summary statistics
//! - Feature standardization

mod dataset;
mod scaler;
mod summary;

pub use dataset::{
    coerce_numeric, read_csv, validate_columns, LoanDataset, CREDIT_SCORE_IDX, FEATURES,
    INCOME_IDX, LOAN_AMOUNT_IDX, TARGET,
};
pub use scaler::StandardScaler;
pub use summary::DatasetSummary;
