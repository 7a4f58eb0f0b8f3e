//! Seeded hold-out splitting with optional stratification

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A single train/test partition of row indices
#[derive(Debug, Clone, PartialEq)]
pub struct HoldoutSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub stratified: bool,
}

impl HoldoutSplit {
    /// Gather the rows of `x` and `y` for each side of the split
    pub fn apply(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>) {
        (
            x.select(Axis(0), &self.train_indices),
            x.select(Axis(0), &self.test_indices),
            y.select(Axis(0), &self.train_indices),
            y.select(Axis(0), &self.test_indices),
        )
    }
}

/// Train/test splitter
pub struct HoldoutSplitter {
    test_size: f64,
    random_state: u64,
}

impl HoldoutSplitter {
    pub fn new(test_size: f64) -> Self {
        Self {
            test_size,
            random_state: 0,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Number of held-out rows for `n_samples`, rounded up
    pub fn n_test(&self, n_samples: usize) -> usize {
        (self.test_size * n_samples as f64).ceil() as usize
    }

    /// Split `y.len()` rows. Stratifies by class when more than one class is present.
    pub fn split(&self, y: &Array1<f64>) -> Result<HoldoutSplit> {
        let n_samples = y.len();
        let n_test = self.n_test(n_samples);
        let n_train = n_samples.saturating_sub(n_test);

        if n_test == 0 || n_train == 0 {
            return Err(LoanError::TrainingError(format!(
                "With n_samples={}, test_size={} the resulting train set or test set is empty",
                n_samples, self.test_size
            )));
        }

        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);

        if class_indices.len() < 2 {
            let mut indices: Vec<usize> = (0..n_samples).collect();
            indices.shuffle(&mut rng);
            let train_indices = indices.split_off(n_test);
            return Ok(HoldoutSplit {
                train_indices,
                test_indices: indices,
                stratified: false,
            });
        }

        let allocation = allocate_test_counts(&class_indices, n_samples, n_test);

        let mut train_indices = Vec::with_capacity(n_train);
        let mut test_indices = Vec::with_capacity(n_test);
        for (indices, &take) in class_indices.values_mut().zip(allocation.iter()) {
            indices.shuffle(&mut rng);
            test_indices.extend_from_slice(&indices[..take]);
            train_indices.extend_from_slice(&indices[take..]);
        }
        train_indices.shuffle(&mut rng);
        test_indices.shuffle(&mut rng);

        Ok(HoldoutSplit {
            train_indices,
            test_indices,
            stratified: true,
        })
    }
}

/// Largest-remainder allocation of `n_test` slots across classes,
/// proportional to class size. Ties go to the lower class label.
fn allocate_test_counts(
    class_indices: &BTreeMap<i64, Vec<usize>>,
    n_samples: usize,
    n_test: usize,
) -> Vec<usize> {
    let exact: Vec<f64> = class_indices
        .values()
        .map(|idx| idx.len() as f64 * n_test as f64 / n_samples as f64)
        .collect();

    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_test - counts.iter().sum::<usize>();

    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    for i in order {
        if remaining == 0 {
            break;
        }
        if counts[i] < class_indices.values().nth(i).map_or(0, Vec::len) {
            counts[i] += 1;
            remaining -= 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_pos: usize, n_neg: usize) -> Array1<f64> {
        let mut v = vec![1.0; n_pos];
        v.extend(vec![0.0; n_neg]);
        Array1::from_vec(v)
    }

    #[test]
    fn test_split_sizes() {
        let y = labels(30, 70);
        let split = HoldoutSplitter::new(0.2).with_random_state(42).split(&y).unwrap();

        assert_eq!(split.test_indices.len(), 20);
        assert_eq!(split.train_indices.len(), 80);
        assert!(split.stratified);

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_n_test_rounds_up() {
        assert_eq!(HoldoutSplitter::new(0.2).n_test(100), 20);
        assert_eq!(HoldoutSplitter::new(0.3).n_test(100), 30);
        assert_eq!(HoldoutSplitter::new(0.25).n_test(10), 3);
        assert_eq!(HoldoutSplitter::new(0.1).n_test(5), 1);
        assert_eq!(HoldoutSplitter::new(0.5).n_test(0), 0);
    }

    #[test]
    fn test_stratification_preserves_proportions() {
        let y = labels(30, 70);
        let split = HoldoutSplitter::new(0.3).with_random_state(7).split(&y).unwrap();

        let test_pos = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(split.test_indices.len(), 30);
        assert_eq!(test_pos, 9);
    }

    #[test]
    fn test_single_class_is_not_stratified() {
        let y = labels(0, 10);
        let split = HoldoutSplitter::new(0.2).split(&y).unwrap();
        assert!(!split.stratified);
        assert_eq!(split.test_indices.len(), 2);
    }

    #[test]
    fn test_same_seed_same_split() {
        let y = labels(12, 40);
        let a = HoldoutSplitter::new(0.25).with_random_state(3).split(&y).unwrap();
        let b = HoldoutSplitter::new(0.25).with_random_state(3).split(&y).unwrap();
        let c = HoldoutSplitter::new(0.25).with_random_state(4).split(&y).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_too_few_rows() {
        let y = labels(1, 0);
        assert!(HoldoutSplitter::new(0.2).split(&y).is_err());
        assert!(HoldoutSplitter::new(0.2).split(&Array1::zeros(0)).is_err());
    }

    #[test]
    fn test_apply_selects_rows() {
        let x = Array2::from_shape_fn((4, 2), |(i, j)| (i * 10 + j) as f64);
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 1.0]);
        let split = HoldoutSplit {
            train_indices: vec![0, 3],
            test_indices: vec![1, 2],
            stratified: true,
        };
        let (x_tr, x_te, y_tr, y_te) = split.apply(&x, &y);
        assert_eq!(x_tr.row(1).to_vec(), vec![30.0, 31.0]);
        assert_eq!(x_te.nrows(), 2);
        assert_eq!(y_tr.to_vec(), vec![0.0, 1.0]);
        assert_eq!(y_te.to_vec(), vec![1.0, 0.0]);
    }
}
