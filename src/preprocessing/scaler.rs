//! Feature standardization

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column parameters learned during fit
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: Array1<f64>, // column mean
    scale: Array1<f64>,  // population std, 1.0 for constant columns
}

/// Z-score scaler: `(x - mean) / std`, fitted on the training partition only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self { params: None }
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Learn column means and standard deviations
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(LoanError::TrainingError(
                "Cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let center = x
            .mean_axis(Axis(0))
            .ok_or_else(|| LoanError::TrainingError("Cannot compute column means".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.params = Some(ScalerParams { center, scale });
        Ok(self)
    }

    /// Standardize with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(LoanError::ModelNotFitted)?;

        if x.ncols() != params.center.len() {
            return Err(LoanError::ShapeError {
                expected: format!("{} columns", params.center.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok((x - &params.center) / &params.scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}
