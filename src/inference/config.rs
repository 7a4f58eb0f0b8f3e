//! Inference configuration

use crate::error::{LoanError, Result};
use crate::training::ModelKind;
use serde::{Deserialize, Serialize};

/// Allowed range for the classification threshold
pub const THRESHOLD_RANGE: (f64, f64) = (0.1, 0.9);

/// Which model to query and where to cut its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Model kind to load from the store
    pub model: ModelKind,

    /// Threshold for binary classification; `prob >= threshold` is class 1
    pub classification_threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Logreg,
            classification_threshold: 0.5,
        }
    }
}

impl InferenceConfig {
    /// Create a config, rejecting a threshold outside `[0.1, 0.9]`
    pub fn new(model: ModelKind, classification_threshold: f64) -> Result<Self> {
        let (lo, hi) = THRESHOLD_RANGE;
        if !(lo..=hi).contains(&classification_threshold) {
            return Err(LoanError::InvalidParameter {
                name: "threshold".to_string(),
                value: classification_threshold.to_string(),
                reason: format!("must be between {} and {}", lo, hi),
            });
        }

        Ok(Self {
            model,
            classification_threshold,
        })
    }
}
