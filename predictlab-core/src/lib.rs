//! PredictLab Core — price frames, features, labels, classifiers.
//!
//! This crate holds everything that runs before model selection:
//! - Price bars and the column-oriented `PriceFrame`
//! - Schema validation of input frames
//! - Causal indicators (RSI, EMA, rolling std, percent change)
//! - The feature engine and forward-return label generator
//! - The `Classifier` trait and its four implementations
//! - A BLAKE3 seed tree so parallel fits stay deterministic

pub mod domain;
pub mod features;
pub mod indicators;
pub mod labels;
pub mod models;
pub mod rng;
pub mod schema;

#[cfg(test)]
mod test_support;

pub use domain::{PriceBar, PriceFrame};
pub use features::{add_indicators, FeatureConfig, FeatureError, FeatureTable, FEATURE_NAMES};
pub use labels::{add_target, LabelConfig, LabeledTable};
pub use models::{CandidateKind, Classifier, ModelConfig, ModelError};
pub use schema::SchemaError;
