//! Logistic regression and its standardizing pipeline

use super::{class_weights, ClassWeight, Classifier};
use crate::error::{LoanError, Result};
use crate::preprocessing::StandardScaler;
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Solve symmetric positive-definite system Ax = b using Cholesky decomposition.
/// Adds a small ridge and retries once if the matrix is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    cholesky_solve_inner(a, b).or_else(|| {
        let mut a_reg = a.clone();
        let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64 + 1e-12;
        for k in 0..n {
            a_reg[[k, k]] += ridge;
        }
        cholesky_solve_inner(&a_reg, b)
    })
}

fn cholesky_solve_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Binary logistic regression with an L2 penalty on the coefficients.
///
/// Minimizes `0.5 * ||w||^2 + C * sum_i s_i * logloss_i` with Newton steps and
/// a backtracking line search. The intercept is not penalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum Newton iterations
    pub max_iter: usize,
    /// Gradient tolerance (max-norm)
    pub tol: f64,
    /// Iterations used by the last fit
    pub n_iter: usize,
    /// Whether the last fit met the tolerance
    pub converged: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: 1.0,
            max_iter: 200,
            tol: 1e-4,
            n_iter: 0,
            converged: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Penalized weighted loss for augmented parameters `[w..., b]`
    fn objective(&self, xa: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, theta: &Array1<f64>) -> f64 {
        let d = theta.len() - 1;
        let z = xa.dot(theta);
        let data_loss: f64 = z
            .iter()
            .zip(y.iter())
            .zip(w.iter())
            .map(|((&zi, &yi), &wi)| wi * (log1p_exp(zi) - yi * zi))
            .sum();
        let penalty = 0.5 * theta.slice(s![..d]).mapv(|v| v * v).sum();
        penalty + self.c * data_loss
    }

    /// Fit with per-sample weights
    pub fn fit_weighted(&mut self, x: &Array2<f64>, y: &Array1<f64>, sample_weight: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() || n_samples != sample_weight.len() {
            return Err(LoanError::ShapeError {
                expected: format!("y and weights of length {}", n_samples),
                actual: format!("y length = {}, weights length = {}", y.len(), sample_weight.len()),
            });
        }

        let has_pos = y.iter().any(|&v| v == 1.0);
        let has_neg = y.iter().any(|&v| v == 0.0);
        if !(has_pos && has_neg) {
            return Err(LoanError::TrainingError(
                "Logistic regression needs samples of both classes in the training data".to_string(),
            ));
        }

        // Augment with a constant column for the intercept
        let mut xa = Array2::<f64>::ones((n_samples, n_features + 1));
        xa.slice_mut(s![.., ..n_features]).assign(x);

        let mut theta = Array1::<f64>::zeros(n_features + 1);
        let mut loss = self.objective(&xa, y, sample_weight, &theta);
        self.converged = false;
        self.n_iter = 0;

        for iter in 0..self.max_iter {
            let p = xa.dot(&theta).mapv(sigmoid);

            // Gradient: C * Xa^T (s * (p - y)) + [w; 0]
            let residual = (&p - y) * sample_weight;
            let mut grad = xa.t().dot(&residual) * self.c;
            for j in 0..n_features {
                grad[j] += theta[j];
            }

            let grad_norm = grad.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_norm < self.tol {
                self.converged = true;
                self.n_iter = iter;
                break;
            }

            // Hessian: C * Xa^T diag(s * p * (1 - p)) Xa + diag([1..1, 0])
            let curvature = (&p * &p.mapv(|v| 1.0 - v)) * sample_weight * self.c;
            let weighted = &xa * &curvature.insert_axis(ndarray::Axis(1));
            let mut hessian = xa.t().dot(&weighted);
            for j in 0..n_features {
                hessian[[j, j]] += 1.0;
            }

            let direction = cholesky_solve(&hessian, &grad).unwrap_or_else(|| grad.clone());

            // Backtracking line search (Armijo)
            let slope = grad.dot(&direction);
            let mut step = 1.0;
            let mut candidate = &theta - &(&direction * step);
            let mut candidate_loss = self.objective(&xa, y, sample_weight, &candidate);
            while candidate_loss > loss - 1e-4 * step * slope && step > 1e-10 {
                step *= 0.5;
                candidate = &theta - &(&direction * step);
                candidate_loss = self.objective(&xa, y, sample_weight, &candidate);
            }

            if candidate_loss > loss {
                // No descent possible along this direction; keep the best parameters found
                self.n_iter = iter + 1;
                break;
            }

            theta = candidate;
            loss = candidate_loss;
            self.n_iter = iter + 1;
        }

        if !self.converged {
            warn!(
                iterations = self.n_iter,
                max_iter = self.max_iter,
                "Logistic regression did not converge, using best-effort parameters"
            );
        } else {
            debug!(iterations = self.n_iter, loss, "Logistic regression converged");
        }

        self.coefficients = Some(theta.slice(s![..n_features]).to_owned());
        self.intercept = Some(theta[n_features]);
        Ok(self)
    }

    /// Predict probabilities of class 1
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(LoanError::ModelNotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);

        if x.ncols() != coefficients.len() {
            return Err(LoanError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok((x.dot(coefficients) + intercept).mapv(sigmoid))
    }
}

/// Standardize features, then apply a class-weighted logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticPipeline {
    pub scaler: StandardScaler,
    pub classifier: LogisticRegression,
    pub class_weight: ClassWeight,
}

impl Default for LogisticPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticPipeline {
    pub fn new() -> Self {
        Self {
            scaler: StandardScaler::new(),
            classifier: LogisticRegression::new(),
            class_weight: ClassWeight::Balanced,
        }
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_classifier(mut self, classifier: LogisticRegression) -> Self {
        self.classifier = classifier;
        self
    }
}

impl Classifier for LogisticPipeline {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let x_scaled = self.scaler.fit_transform(x)?;
        let weights = class_weights(y, self.class_weight);
        self.classifier.fit_weighted(&x_scaled, y, &weights)?;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_scaled = self.scaler.transform(x)?;
        self.classifier.predict_proba(&x_scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_logistic_separates_classes() {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let w = Array1::ones(8);

        let mut model = LogisticRegression::new();
        model.fit_weighted(&x, &y, &w).unwrap();
        assert!(model.converged);

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[7] > 0.5);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        // symmetric data, unpenalized intercept stays near zero
        assert!(model.intercept.unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_regularization_shrinks_coefficients() {
        let x = array![[-1.0], [-0.5], [0.5], [1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let w = Array1::ones(4);

        let mut weak = LogisticRegression::new().with_c(100.0);
        weak.fit_weighted(&x, &y, &w).unwrap();
        let mut strong = LogisticRegression::new().with_c(0.01);
        strong.fit_weighted(&x, &y, &w).unwrap();

        let weak_coef = weak.coefficients.as_ref().unwrap()[0];
        let strong_coef = strong.coefficients.as_ref().unwrap()[0];
        assert!(weak_coef > strong_coef);
        assert!(strong_coef > 0.0);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut model = LogisticRegression::new();
        let result = model.fit_weighted(&x, &y, &Array1::ones(2));
        assert!(matches!(result, Err(LoanError::TrainingError(_))));
    }

    #[test]
    fn test_iteration_budget_is_soft() {
        let x = array![[-1.0], [-0.5], [0.5], [1.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let mut model = LogisticRegression::new().with_max_iter(1).with_tol(1e-14);
        model.fit_weighted(&x, &y, &Array1::ones(4)).unwrap();
        assert!(model.is_fitted());
        assert_eq!(model.n_iter, 1);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LogisticRegression::new();
        assert!(matches!(model.predict_proba(&array![[1.0]]), Err(LoanError::ModelNotFitted)));
    }

    #[test]
    fn test_pipeline_on_raw_scale_features() {
        let x = array![
            [25.0, 20000.0, 15000.0, 560.0],
            [30.0, 25000.0, 14000.0, 580.0],
            [28.0, 22000.0, 16000.0, 570.0],
            [45.0, 90000.0, 5000.0, 760.0],
            [50.0, 85000.0, 6000.0, 780.0],
            [41.0, 95000.0, 4000.0, 740.0],
        ];
        let y = array![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

        let mut pipeline = LogisticPipeline::new();
        pipeline.fit(&x, &y).unwrap();

        let proba = pipeline.predict_proba(&x).unwrap();
        for (p, t) in proba.iter().zip(y.iter()) {
            assert_eq!(*p >= 0.5, *t == 1.0);
        }
    }
}
