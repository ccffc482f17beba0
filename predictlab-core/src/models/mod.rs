//! Binary classifiers behind a single capability interface.
//!
//! Every algorithm implements [`Classifier`]: `fit` on a row-major feature
//! matrix with 0/1 labels, then `predict_proba` returning P(label = 1) per
//! row. Model selection treats all of them interchangeably.

pub mod boosting;
pub mod forest;
pub mod kind;
pub mod logistic;
pub mod tree;

use std::fmt::Debug;

use thiserror::Error;

pub use boosting::{BoostedTrees, BoostingParams};
pub use forest::{ForestParams, RandomForest};
pub use kind::{CandidateKind, ModelConfig};
pub use logistic::{LogisticParams, LogisticRegression};
pub use tree::{RegressionTree, TreeParams};

/// Errors raised while fitting or applying a single classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("row {row} has {got} features, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("label {0} is not binary")]
    InvalidLabel(u8),

    #[error("training labels contain a single class ({0})")]
    SingleClass(u8),

    #[error("non-finite feature value at row {row}, column {column}")]
    NonFiniteFeature { row: usize, column: usize },

    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("training diverged: {0}")]
    Diverged(String),
}

pub trait Classifier: Send + Sync + Debug {
    /// Short identifier, e.g. "logistic".
    fn name(&self) -> &str;

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError>;

    /// P(label = 1) for every row.
    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;

    /// Hard labels: 1 where P(label = 1) > 0.5.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u8>, ModelError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}

/// Fraction of positions where `predicted` equals `actual`. 0 for empty input.
pub fn accuracy(predicted: &[u8], actual: &[u8]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let hits = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    hits as f64 / n as f64
}

/// Validate a training set and return the feature width.
pub(crate) fn check_training_set(features: &[Vec<f64>], labels: &[u8]) -> Result<usize, ModelError> {
    if features.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if features.len() != labels.len() {
        return Err(ModelError::LengthMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&l| l > 1) {
        return Err(ModelError::InvalidLabel(bad));
    }
    let width = features[0].len();
    check_rows(features, width)?;
    Ok(width)
}

/// Every row has `width` finite values.
pub(crate) fn check_rows(features: &[Vec<f64>], width: usize) -> Result<(), ModelError> {
    for (row, values) in features.iter().enumerate() {
        if values.len() != width {
            return Err(ModelError::DimensionMismatch {
                row,
                expected: width,
                got: values.len(),
            });
        }
        if let Some(column) = values.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteFeature { row, column });
        }
    }
    Ok(())
}

/// Fail with `SingleClass` unless both labels occur.
pub(crate) fn require_both_classes(labels: &[u8]) -> Result<(), ModelError> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    match positives {
        0 => Err(ModelError::SingleClass(0)),
        p if p == labels.len() => Err(ModelError::SingleClass(1)),
        _ => Ok(()),
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
