//! Random forest classifier.
//!
//! Bagged CART trees with a random feature subset per split. Probability is
//! the mean of the trees' leaf class-1 frequencies. Trees are grown in
//! parallel; each tree's bootstrap sample and feature draws come from its own
//! `SeedTree` stream, so the fitted forest does not depend on thread count.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{check_rows, check_training_set, Classifier, ModelError};
use crate::rng::SeedTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split; `None` uses ceil(sqrt(n_features)).
    pub max_features: Option<usize>,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    seed: u64,
    trees: Vec<RegressionTree>,
    n_features: Option<usize>,
}

impl RandomForest {
    pub fn new(params: ForestParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            trees: Vec::new(),
            n_features: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError> {
        let n_features = check_training_set(features, labels)?;
        let n = features.len();

        let max_features = self
            .params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .max(1);
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: Some(max_features),
            lambda: 0.0,
            min_child_weight: 0.0,
        };

        let grad: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let hess = vec![1.0; n];
        let seeds = SeedTree::new(self.seed);
        let bootstrap = self.params.bootstrap;

        let trees: Vec<RegressionTree> = (0..self.params.n_trees.max(1))
            .into_par_iter()
            .map(|t| {
                let mut rng = seeds.rng_for("tree", t as u64);
                let indices: Vec<usize> = if bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(features, &grad, &hess, &indices, &tree_params, &mut rng)
            })
            .collect();

        self.trees = trees;
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let width = self.n_features.ok_or(ModelError::NotFitted)?;
        check_rows(features, width)?;
        let n_trees = self.trees.len() as f64;
        Ok(features
            .iter()
            .map(|row| {
                let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect())
    }
}
