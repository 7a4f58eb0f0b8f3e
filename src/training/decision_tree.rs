//! Weighted Gini decision tree for binary classification

use super::{class_weights, ClassWeight, Classifier};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the weighted share of class 1
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node: `x[feature_idx] <= threshold` goes left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Weighted class totals for a set of samples
#[derive(Debug, Clone, Copy, Default)]
struct ClassTotals {
    neg: f64,
    pos: f64,
}

impl ClassTotals {
    fn add(&mut self, label: f64, weight: f64) {
        if label == 1.0 {
            self.pos += weight;
        } else {
            self.neg += weight;
        }
    }

    fn total(&self) -> f64 {
        self.neg + self.pos
    }

    fn gini(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let p = self.pos / total;
        let q = self.neg / total;
        1.0 - p * p - q * q
    }

    fn positive_share(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 { 0.0 } else { self.pos / total }
    }
}

/// Best split found for one feature
#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Sample weighting
    pub class_weight: ClassWeight,
    /// Seed for the order in which features are scanned
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Uniform,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree with per-sample weights
    pub fn fit_weighted(&mut self, x: &Array2<f64>, y: &Array1<f64>, sample_weight: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() || n_samples != sample_weight.len() {
            return Err(LoanError::ShapeError {
                expected: format!("y and weights of length {}", n_samples),
                actual: format!("y length = {}, weights length = {}", y.len(), sample_weight.len()),
            });
        }

        if n_samples == 0 {
            return Err(LoanError::TrainingError(
                "Cannot fit a decision tree on zero samples".to_string(),
            ));
        }

        self.n_features = n_features;
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let mut importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(x, y, sample_weight, &indices, 0, &mut importances, &mut rng);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let mut totals = ClassTotals::default();
        for &i in indices {
            totals.add(y[i], w[i]);
        }
        let leaf = TreeNode::Leaf {
            value: totals.positive_share(),
            n_samples,
        };

        let parent_impurity = totals.gini();
        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || parent_impurity <= f64::EPSILON;

        if should_stop {
            return leaf;
        }

        let mut feature_order: Vec<usize> = (0..x.ncols()).collect();
        feature_order.shuffle(rng);

        let Some(best) = self.find_best_split(x, y, w, indices, &totals, &feature_order) else {
            return leaf;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += totals.total() * best.gain;

        let left = Box::new(self.build_tree(x, y, w, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, w, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity: parent_impurity,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: &[usize],
        totals: &ClassTotals,
        feature_order: &[usize],
    ) -> Option<Candidate> {
        let parent_impurity = totals.gini();
        let parent_weight = totals.total();
        let n = indices.len();
        let min_leaf = self.min_samples_leaf;

        // Each feature is scanned independently; results are combined in seeded order
        let per_feature: Vec<Option<Candidate>> = feature_order
            .par_iter()
            .map(|&feature_idx| {
                let mut sorted: Vec<usize> = indices.to_vec();
                sorted.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

                let mut left = ClassTotals::default();
                let mut best: Option<Candidate> = None;

                for pos in 0..n - 1 {
                    let i = sorted[pos];
                    left.add(y[i], w[i]);

                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < min_leaf {
                        continue;
                    }
                    if n_right < min_leaf {
                        break;
                    }

                    let current = x[[i, feature_idx]];
                    let next = x[[sorted[pos + 1], feature_idx]];
                    if next <= current {
                        continue;
                    }

                    let right = ClassTotals {
                        neg: totals.neg - left.neg,
                        pos: totals.pos - left.pos,
                    };
                    let weighted_child_impurity =
                        (left.total() * left.gini() + right.total() * right.gini()) / parent_weight;
                    let gain = parent_impurity - weighted_child_impurity;

                    if gain > best.map_or(0.0, |b| b.gain) {
                        let mut threshold = current + (next - current) / 2.0;
                        if threshold >= next {
                            threshold = current;
                        }
                        best = Some(Candidate { feature_idx, threshold, gain });
                    }
                }

                best
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<Candidate>, c| match acc {
                Some(a) if a.gain >= c.gain => Some(a),
                _ => Some(c),
            })
    }

    /// Probability of class 1 for each row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(LoanError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(LoanError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| Self::predict_sample(root, &row)).collect())
    }

    fn predict_sample(node: &TreeNode, sample: &ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels on the longest root-to-leaf path
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }

    /// Smallest leaf, in samples
    pub fn min_leaf_size(&self) -> usize {
        fn smallest(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { n_samples, .. } => *n_samples,
                TreeNode::Split { left, right, .. } => smallest(left).min(smallest(right)),
            }
        }
        self.root.as_ref().map_or(0, smallest)
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let weights = class_weights(y, self.class_weight);
        self.fit_weighted(x, y, &weights)?;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict_proba(self, x)
    }
}
