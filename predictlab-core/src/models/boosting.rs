//! Gradient-boosted trees on log-loss.
//!
//! Each round fits a [`RegressionTree`] to `g = y - p`, `h = p(1 - p)` and
//! adds `learning_rate * leaf` to the raw score. Two presets share this
//! code: a classic shallow booster and a regularized one with an L2 leaf
//! penalty and a minimum child hessian.

use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{RegressionTree, TreeParams};
use super::{check_rows, check_training_set, require_both_classes, sigmoid, Classifier, ModelError};
use crate::rng::SeedTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
    /// Fraction of rows drawn (without replacement) per round.
    pub subsample: f64,
}

impl BoostingParams {
    pub fn gradient_boosting_default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            lambda: 0.0,
            min_child_weight: 1e-3,
            subsample: 1.0,
        }
    }

    pub fn regularized_default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            lambda: 1.0,
            min_child_weight: 1.0,
            subsample: 1.0,
        }
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: None,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
        }
    }
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self::gradient_boosting_default()
    }
}

#[derive(Debug, Clone)]
pub struct BoostedTrees {
    name: &'static str,
    params: BoostingParams,
    seed: u64,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: Option<usize>,
}

impl BoostedTrees {
    pub fn new(name: &'static str, params: BoostingParams, seed: u64) -> Self {
        Self {
            name,
            params,
            seed,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: None,
        }
    }

    pub fn gradient_boosting(params: BoostingParams, seed: u64) -> Self {
        Self::new("gradient_boosting", params, seed)
    }

    pub fn regularized(params: BoostingParams, seed: u64) -> Self {
        Self::new("regularized_boosting", params, seed)
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }

    fn raw_score(&self, row: &[f64]) -> f64 {
        let lr = self.params.learning_rate;
        self.base_score + self.trees.iter().map(|t| lr * t.predict_row(row)).sum::<f64>()
    }
}

impl Classifier for BoostedTrees {
    fn name(&self) -> &str {
        self.name
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError> {
        let width = check_training_set(features, labels)?;
        require_both_classes(labels)?;
        let n = features.len();

        let y: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let positives = y.iter().sum::<f64>();
        let base_score = (positives / (n as f64 - positives)).ln();

        let tree_params = self.params.tree_params();
        let seeds = SeedTree::new(self.seed);
        let lr = self.params.learning_rate;
        let sample_size = ((n as f64 * self.params.subsample.clamp(0.0, 1.0)).ceil() as usize)
            .clamp(1, n);

        let mut raw = vec![base_score; n];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for round in 0..self.params.n_estimators {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                grad[i] = y[i] - p;
                hess[i] = p * (1.0 - p);
            }

            let mut rng = seeds.rng_for("round", round as u64);
            let indices: Vec<usize> = if sample_size < n {
                let mut picked = sample(&mut rng, n, sample_size).into_vec();
                picked.sort_unstable();
                picked
            } else {
                (0..n).collect()
            };

            let tree = RegressionTree::fit(features, &grad, &hess, &indices, &tree_params, &mut rng);
            for (score, row) in raw.iter_mut().zip(features) {
                *score += lr * tree.predict_row(row);
            }
            if raw.iter().any(|s| !s.is_finite()) {
                return Err(ModelError::Diverged(format!(
                    "{}: non-finite score after round {round}",
                    self.name
                )));
            }
            trees.push(tree);
        }

        debug!(
            model = self.name,
            rounds = trees.len(),
            base_score,
            "boosted trees fitted"
        );
        self.base_score = base_score;
        self.trees = trees;
        self.n_features = Some(width);
        Ok(())
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let width = self.n_features.ok_or(ModelError::NotFitted)?;
        check_rows(features, width)?;
        Ok(features
            .iter()
            .map(|row| sigmoid(self.raw_score(row)))
            .collect())
    }
}
