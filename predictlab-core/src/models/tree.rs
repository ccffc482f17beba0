//! CART regression tree over gradient statistics.
//!
//! Every sample carries a gradient `g` and a hessian `h`. A leaf predicts
//! `G / (H + lambda)` and a split is scored by
//!
//! ```text
//! gain = G_L² / (H_L + λ) + G_R² / (H_R + λ) - G² / (H + λ)
//! ```
//!
//! With `g = label`, `h = 1`, `λ = 0` the leaf value is the class-1 frequency
//! and the gain is the Gini impurity decrease (for binary labels Gini is twice
//! the variance), which is how the random forest uses it. Boosting passes
//! log-loss residuals and `p(1-p)` hessians instead.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them.
    pub max_features: Option<usize>,
    /// L2 penalty on leaf values.
    pub lambda: f64,
    /// Minimum hessian sum on each side of a split.
    pub min_child_weight: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            lambda: 0.0,
            min_child_weight: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Node,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    features: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a TreeParams,
    n_features: usize,
}

impl RegressionTree {
    /// Fit on the samples listed in `indices` (repeats allowed, for bootstrap).
    ///
    /// `grad` and `hess` are indexed like `features`. `rng` only drives the
    /// per-split feature subset, so with `max_features = None` the tree is
    /// fully deterministic.
    pub fn fit(
        features: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let builder = Builder {
            features,
            grad,
            hess,
            params,
            n_features: features.first().map_or(0, |r| r.len()),
        };
        Self {
            root: builder.build(indices.to_vec(), 0, rng),
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        fn leaves_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => leaves_of(left) + leaves_of(right),
            }
        }
        leaves_of(&self.root)
    }
}

impl Builder<'_> {
    fn build(&self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> Node {
        let (g, h) = self.sums(&indices);
        let leaf = Node::Leaf {
            value: leaf_value(g, h, self.params.lambda),
        };

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split.max(2)
        {
            return leaf;
        }

        let Some(best) = self.best_split(&indices, g, h, rng) else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(left_idx, depth + 1, rng)),
            right: Box::new(self.build(right_idx, depth + 1, rng)),
        }
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + self.grad[i], h + self.hess[i])
        })
    }

    fn best_split(
        &self,
        indices: &[usize],
        g: f64,
        h: f64,
        rng: &mut StdRng,
    ) -> Option<Candidate> {
        let lambda = self.params.lambda;
        let parent_score = score(g, h, lambda);
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut feature_order: Vec<usize> = (0..self.n_features).collect();
        if let Some(k) = self.params.max_features {
            feature_order.shuffle(rng);
            feature_order.truncate(k.clamp(1, self.n_features.max(1)));
        }

        let mut best: Option<Candidate> = None;
        let mut sorted = indices.to_vec();

        for &feature in &feature_order {
            sorted.sort_by(|&a, &b| {
                self.features[a][feature].total_cmp(&self.features[b][feature])
            });

            let mut gl = 0.0;
            let mut hl = 0.0;
            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                gl += self.grad[i];
                hl += self.hess[i];

                let here = self.features[i][feature];
                let next = self.features[sorted[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = sorted.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let gr = g - gl;
                let hr = h - hl;
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }

                let gain = score(gl, hl, lambda) + score(gr, hr, lambda) - parent_score;
                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    let denom = h + lambda;
    if denom <= 0.0 {
        0.0
    } else {
        g * g / denom
    }
}

fn leaf_value(g: f64, h: f64, lambda: f64) -> f64 {
    let denom = h + lambda;
    if denom <= 0.0 {
        0.0
    } else {
        g / denom
    }
}
