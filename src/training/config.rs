//! Training configuration and model kinds

use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Allowed range for the held-out fraction
pub const TEST_SIZE_RANGE: (f64, f64) = (0.1, 0.5);

/// Seed used for the tree's feature ordering regardless of the split seed
pub const TREE_RANDOM_STATE: u64 = 42;

/// The two model kinds the service trains and serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Standardized L2 logistic regression
    Logreg,
    /// Depth-limited Gini decision tree
    Tree,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Logreg, ModelKind::Tree];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Logreg => "logreg",
            ModelKind::Tree => "tree",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "logreg" => Ok(ModelKind::Logreg),
            "tree" => Ok(ModelKind::Tree),
            other => Err(format!("unknown model '{}', expected 'logreg' or 'tree'", other)),
        }
    }
}

/// Sample weighting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample counts once
    Uniform,
    /// Weight each class by `n_samples / (n_classes * n_class_samples)`
    Balanced,
}

/// Parameters of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test split
    pub random_state: u64,
    /// Probability cut-off used when scoring the held-out rows
    pub eval_threshold: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            eval_threshold: 0.5,
        }
    }
}

impl TrainingConfig {
    /// Create a config, rejecting a test fraction outside `[0.1, 0.5]`
    pub fn new(test_size: f64, random_state: u64) -> Result<Self> {
        let (lo, hi) = TEST_SIZE_RANGE;
        if !(lo..=hi).contains(&test_size) {
            return Err(LoanError::InvalidParameter {
                name: "test_size".to_string(),
                value: test_size.to_string(),
                reason: format!("must be between {} and {}", lo, hi),
            });
        }

        Ok(Self {
            test_size,
            random_state,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_round_trip_names() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{}\"", kind));
        }
        assert!("forest".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_config_bounds() {
        assert!(TrainingConfig::new(0.1, 0).is_ok());
        assert!(TrainingConfig::new(0.5, 0).is_ok());
        assert!(TrainingConfig::new(0.05, 0).is_err());
        assert!(TrainingConfig::new(0.55, 0).is_err());
        assert!(TrainingConfig::new(f64::NAN, 0).is_err());
    }
}
