//! Error types for the loan default service

use crate::training::ModelKind;
use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, LoanError>;

/// Main error type for dataset handling, training and the model store
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Failed to read CSV: {0}")]
    ParseError(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Model '{0}' not trained yet.")]
    ModelNotTrained(ModelKind),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for LoanError {
    fn from(err: polars::error::PolarsError) -> Self {
        LoanError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(err: serde_json::Error) -> Self {
        LoanError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LoanError {
    fn from(err: ndarray::ShapeError) -> Self {
        LoanError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoanError::ModelNotTrained(ModelKind::Tree);
        assert_eq!(err.to_string(), "Model 'tree' not trained yet.");

        let err = LoanError::ParseError("bad row".to_string());
        assert_eq!(err.to_string(), "Failed to read CSV: bad row");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LoanError = io_err.into();
        assert!(matches!(err, LoanError::IoError(_)));
    }
}
