//! L2-regularized logistic regression trained by batch gradient descent.
//!
//! Inputs are standardized with the training means and standard deviations
//! before fitting; the same transform is applied at prediction time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_rows, check_training_set, require_both_classes, sigmoid, Classifier, ModelError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this.
    pub tolerance: f64,
    /// Inverse regularization strength.
    pub c: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 500,
            tolerance: 1e-6,
            c: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Fitted {
    means: Vec<f64>,
    scales: Vec<f64>,
    weights: Vec<f64>,
    bias: f64,
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: LogisticParams,
    fitted: Option<Fitted>,
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    /// Weights in standardized feature space, once fitted.
    pub fn weights(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.weights.as_slice())
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticParams::default())
    }
}

fn standardize(row: &[f64], means: &[f64], scales: &[f64]) -> Vec<f64> {
    row.iter()
        .zip(means.iter().zip(scales))
        .map(|(v, (m, s))| (v - m) / s)
        .collect()
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic"
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError> {
        let width = check_training_set(features, labels)?;
        require_both_classes(labels)?;
        let n = features.len() as f64;

        let mut means = vec![0.0; width];
        for row in features {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; width];
        for row in features {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for s in scales.iter_mut() {
            let std = (*s / n).sqrt();
            *s = if std > 1e-12 { std } else { 1.0 };
        }

        let x: Vec<Vec<f64>> = features
            .iter()
            .map(|row| standardize(row, &means, &scales))
            .collect();
        let y: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();

        let mut weights = vec![0.0; width];
        let mut bias = 0.0;
        let lr = self.params.learning_rate;
        let l2 = 1.0 / (self.params.c.max(1e-12) * n);
        let mut iterations = 0;

        for _ in 0..self.params.max_iter {
            iterations += 1;
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, target) in x.iter().zip(&y) {
                let z = bias + row.iter().zip(&weights).map(|(a, w)| a * w).sum::<f64>();
                let err = sigmoid(z) - target;
                for (g, a) in grad_w.iter_mut().zip(row) {
                    *g += err * a;
                }
                grad_b += err;
            }

            let mut max_grad = (grad_b / n).abs();
            for (g, w) in grad_w.iter_mut().zip(&weights) {
                *g = *g / n + l2 * w;
                max_grad = max_grad.max(g.abs());
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * g;
            }
            bias -= lr * grad_b / n;

            if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                return Err(ModelError::Diverged(format!(
                    "non-finite weights after {iterations} iterations"
                )));
            }
            if max_grad < self.params.tolerance {
                break;
            }
        }

        debug!(iterations, bias, "logistic regression fitted");
        self.fitted = Some(Fitted {
            means,
            scales,
            weights,
            bias,
        });
        Ok(())
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        check_rows(features, fitted.weights.len())?;
        Ok(features
            .iter()
            .map(|row| {
                let z = standardize(row, &fitted.means, &fitted.scales)
                    .iter()
                    .zip(&fitted.weights)
                    .map(|(a, w)| a * w)
                    .sum::<f64>()
                    + fitted.bias;
                sigmoid(z)
            })
            .collect())
    }
}
