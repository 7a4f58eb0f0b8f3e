//! Inference module
//!
//! Scores a single applicant against a stored model:
//! - Lenient JSON feature coercion
//! - Threshold validation
//! - Probability, thresholded label and an echo of the inputs

mod config;
mod engine;
mod features;

pub use config::{InferenceConfig, THRESHOLD_RANGE};
pub use engine::{Explanation, InferenceEngine, Prediction, EXPLANATION_NOTE};
pub use features::{coerce_value, FeatureVector};
