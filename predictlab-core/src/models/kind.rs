//! Candidate registry: the fixed set of algorithms model selection compares.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    BoostedTrees, BoostingParams, Classifier, ForestParams, LogisticParams, LogisticRegression,
    RandomForest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    RandomForest,
    GradientBoosting,
    Logistic,
    RegularizedBoosting,
}

impl CandidateKind {
    /// Registration order. Ties in selection keep this order.
    pub const ALL: [CandidateKind; 4] = [
        CandidateKind::RandomForest,
        CandidateKind::GradientBoosting,
        CandidateKind::Logistic,
        CandidateKind::RegularizedBoosting,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CandidateKind::RandomForest => "random_forest",
            CandidateKind::GradientBoosting => "gradient_boosting",
            CandidateKind::Logistic => "logistic",
            CandidateKind::RegularizedBoosting => "regularized_boosting",
        }
    }

    /// A fresh, unfitted classifier of this kind.
    pub fn build(self, config: &ModelConfig, seed: u64) -> Box<dyn Classifier> {
        match self {
            CandidateKind::RandomForest => {
                Box::new(RandomForest::new(config.random_forest.clone(), seed))
            }
            CandidateKind::GradientBoosting => Box::new(BoostedTrees::gradient_boosting(
                config.gradient_boosting.clone(),
                seed,
            )),
            CandidateKind::Logistic => Box::new(LogisticRegression::new(config.logistic.clone())),
            CandidateKind::RegularizedBoosting => Box::new(BoostedTrees::regularized(
                config.regularized_boosting.clone(),
                seed,
            )),
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hyperparameters for every candidate, as loaded from the `[models]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub random_forest: ForestParams,
    pub gradient_boosting: BoostingParams,
    pub logistic: LogisticParams,
    pub regularized_boosting: BoostingParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            random_forest: ForestParams::default(),
            gradient_boosting: BoostingParams::gradient_boosting_default(),
            logistic: LogisticParams::default(),
            regularized_boosting: BoostingParams::regularized_default(),
        }
    }
}
