//! Error types for the server

use crate::error::LoanError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Training error: {0}")]
    Training(String),
}

impl From<LoanError> for ServerError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::ParseError(_)
            | LoanError::ValidationError(_)
            | LoanError::DataError(_)
            | LoanError::InvalidParameter { .. } => ServerError::BadRequest(err.to_string()),
            LoanError::ModelNotTrained(_) => ServerError::NotFound(err.to_string()),
            LoanError::TrainingError(_) | LoanError::ModelNotFitted | LoanError::ShapeError { .. } => {
                ServerError::Training(err.to_string())
            }
            LoanError::IoError(e) => ServerError::Io(e),
            LoanError::SerializationError(_) => ServerError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
            ServerError::Io(e) => {
                tracing::error!(detail = %e, "IO error");
                (StatusCode::INTERNAL_SERVER_ERROR, "A file system error occurred".to_string())
            }
            ServerError::Training(msg) => {
                tracing::error!(detail = %msg, "Training error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Training failed. Check server logs for details.".to_string())
            }
        };

        // `detail` mirrors `message` for clients written against the older API
        let body = Json(json!({
            "error": true,
            "message": message,
            "detail": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
