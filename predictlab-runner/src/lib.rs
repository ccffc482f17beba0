//! PredictLab Runner — pipeline orchestration, model selection, evaluation.
//!
//! This crate builds on `predictlab-core` to provide:
//! - TOML pipeline configuration with validation and content hashing
//! - Cross-validated model selection and a soft-voting ensemble
//! - Signal generation from ensemble probabilities
//! - Strategy vs. buy-and-hold evaluation and the metrics table
//! - CSV and synthetic bar loading with dataset hashing
//! - JSON / CSV / Markdown export of run results

pub mod config;
pub mod data_loader;
pub mod ensemble;
pub mod evaluator;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod selector;
pub mod signal;

pub use config::{ConfigError, EvaluationConfig, PipelineConfig, SelectionConfig, SignalConfig};
pub use data_loader::{generate_synthetic_bars, load_csv, load_synthetic, LoadError, LoadedData};
pub use ensemble::{MemberSpec, SoftVotingEnsemble};
pub use evaluator::{evaluate, BacktestReport, BarRecord, EvaluationError, MetricsTable, SummaryMetrics};
pub use runner::{run_on_bars, run_pipeline, BacktestResult, PipelineRun, RunError};
pub use selector::{select_and_fit, CandidateOutcome, ModelCandidate, Selection, SelectionError};
pub use signal::{generate, Signal};
