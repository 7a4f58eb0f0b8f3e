//! Loan Default API - default-risk models behind a small HTTP service
//!
//! This crate provides:
//! - CSV ingestion with column validation and lenient numeric coercion
//! - Logistic regression and decision tree training with hold-out metrics
//! - An on-disk model store with atomic replacement
//! - Single-applicant inference
//! - Web server and CLI interfaces
//!
//! # Modules
//!
//! - [`preprocessing`] - Dataset parsing, validation, summaries and scaling
//! - [`training`] - Models, hold-out splitting, metrics and the training engine
//! - [`store`] - Persistence of fitted models
//! - [`inference`] - Scoring one applicant against a stored model
//! - [`reporting`] - Summary and metrics of the last training run
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

// Persistence and reporting
pub mod store;
pub mod reporting;

// Services
pub mod server;
pub mod cli;

pub use error::{LoanError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{LoanError, Result};
    pub use crate::inference::{FeatureVector, InferenceConfig, InferenceEngine, Prediction};
    pub use crate::preprocessing::{DatasetSummary, LoanDataset};
    pub use crate::reporting::{ReportState, SummaryReport};
    pub use crate::store::ModelStore;
    pub use crate::training::{
        Classifier, MetricsRecord, ModelKind, TrainEngine, TrainedModel, TrainingConfig,
    };
}
