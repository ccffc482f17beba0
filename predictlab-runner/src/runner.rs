//! Pipeline runner — wires features, labels, selection, signals and evaluation.
//!
//! Two entry points:
//! - `run_pipeline()`: takes loaded data with provenance. Used by the CLI.
//! - `run_on_bars()`: takes a bar slice directly. Used by library callers
//!   and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use predictlab_core::domain::frame::CLOSE;
use predictlab_core::domain::{PriceBar, PriceFrame};
use predictlab_core::features::{add_indicators, FeatureError};
use predictlab_core::labels::{add_target, LabelError};
use predictlab_core::models::ModelError;
use predictlab_core::schema::{self, SchemaError};

use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::{LoadError, LoadedData};
use crate::ensemble::SoftVotingEnsemble;
use crate::evaluator::{evaluate, BarRecord, EvaluationError, MetricsTable};
use crate::selector::{select_and_fit, ModelCandidate, SelectionError};
use crate::signal;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("feature error: {0}")]
    Features(#[from] FeatureError),
    #[error("label error: {0}")]
    Label(#[from] LabelError),
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("prediction error: {0}")]
    Model(#[from] ModelError),
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Serializable outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub dataset_hash: String,
    pub config_hash: String,
    pub synthetic: bool,
    pub bar_count: usize,
    pub feature_rows: usize,
    pub labeled_rows: usize,
    pub positive_rate: f64,
    /// Every candidate in registration order.
    pub candidates: Vec<ModelCandidate>,
    pub ensemble_members: Vec<String>,
    pub member_failures: Vec<String>,
    pub holdout_accuracy: f64,
    pub records: Vec<BarRecord>,
    pub metrics: MetricsTable,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    /// Candidate name → cross-validated accuracy.
    pub fn scores(&self) -> Vec<(String, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.name().to_string(), c.score))
            .collect()
    }

    pub fn signal_count(&self) -> usize {
        self.records.len()
    }
}

/// A finished run: the serializable result plus the fitted ensemble.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result: BacktestResult,
    pub ensemble: SoftVotingEnsemble,
}

/// Run the full pipeline over bars with no file provenance.
pub fn run_on_bars(bars: &[PriceBar], config: &PipelineConfig) -> Result<PipelineRun, RunError> {
    let data = LoadedData::from_frame(PriceFrame::from_bars(bars), false);
    run_pipeline(&data, config)
}

/// Run the full pipeline: features → labels → selection → signals → metrics.
pub fn run_pipeline(data: &LoadedData, config: &PipelineConfig) -> Result<PipelineRun, RunError> {
    config.validate()?;
    let frame = &data.frame;
    schema::validate(frame)?;

    let features = add_indicators(frame, &config.features)?;
    let closes = frame
        .column(CLOSE)
        .ok_or_else(|| SchemaError::MissingColumn(CLOSE.into()))?;
    info!(bars = frame.len(), rows = features.len(), "features computed");

    let labeled = add_target(&features, closes, &config.labels)?;
    info!(
        rows = labeled.len(),
        positive_rate = labeled.positive_rate(),
        "labels attached"
    );

    let selection = select_and_fit(&labeled, &config.selection, &config.models)?;

    // every feature row is signalled, including the unlabeled tail
    let signals = signal::generate(&selection.ensemble, &features, config.signal.threshold)?;
    let signal_closes: Vec<f64> = signals.iter().map(|s| closes[s.bar_index]).collect();
    let report = evaluate(&signal_closes, &signals, &config.evaluation)?;
    info!(
        signals = signals.len(),
        longs = signals.iter().filter(|s| s.decision == 1).count(),
        strategy_return = report.metrics.strategy.total_return,
        market_return = report.metrics.market.total_return,
        "evaluation complete"
    );

    let result = BacktestResult {
        schema_version: SCHEMA_VERSION,
        dataset_hash: data.dataset_hash.clone(),
        config_hash: config.config_hash()?,
        synthetic: data.synthetic,
        bar_count: frame.len(),
        feature_rows: features.len(),
        labeled_rows: labeled.len(),
        positive_rate: labeled.positive_rate(),
        candidates: selection.candidates,
        ensemble_members: selection.ensemble.member_names(),
        member_failures: selection.member_failures,
        holdout_accuracy: selection.holdout_accuracy,
        records: report.records,
        metrics: report.metrics,
    };

    Ok(PipelineRun {
        result,
        ensemble: selection.ensemble,
    })
}
