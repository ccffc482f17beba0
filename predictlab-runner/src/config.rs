//! Serializable pipeline configuration.
//!
//! One TOML document with a table per stage. Every table and field has a
//! default, so an empty file is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use predictlab_core::features::{FeatureConfig, FeatureError};
use predictlab_core::labels::LabelConfig;
use predictlab_core::models::ModelConfig;

/// Content-addressable hash of a configuration.
pub type ConfigHash = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Train/validation split, cross-validation and ensemble size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Share of rows held out from training.
    pub test_fraction: f64,
    pub seed: u64,
    pub cv_folds: usize,
    pub ensemble_size: usize,
    /// Fewer labeled rows than this and nothing is trained.
    pub min_samples: usize,
    /// Cross-validate candidates on the rayon pool.
    pub parallel: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            cv_folds: 5,
            ensemble_size: 3,
            min_samples: 50,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Go long when P(up) is strictly above this.
    pub threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self { threshold: 0.6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Annualization factor for volatility and Sharpe.
    pub periods_per_year: f64,
    /// Bars between a decision and the return it earns.
    pub signal_lag: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            signal_lag: 1,
        }
    }
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub labels: LabelConfig,
    pub selection: SelectionConfig,
    pub models: ModelConfig,
    pub signal: SignalConfig,
    pub evaluation: EvaluationConfig,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject values that would make a stage meaningless or panic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(FeatureError::InvalidConfig { field, reason }) = self.features.validate() {
            return Err(invalid(field, reason));
        }

        if self.labels.horizon == 0 {
            return Err(invalid("labels.horizon", "must be >= 1"));
        }
        if !self.labels.threshold.is_finite() {
            return Err(invalid("labels.threshold", "must be finite"));
        }

        let s = &self.selection;
        if !(s.test_fraction > 0.0 && s.test_fraction < 1.0) {
            return Err(invalid(
                "selection.test_fraction",
                format!("must be in (0, 1), got {}", s.test_fraction),
            ));
        }
        if s.cv_folds < 2 {
            return Err(invalid("selection.cv_folds", "must be >= 2"));
        }
        if s.ensemble_size == 0 {
            return Err(invalid("selection.ensemble_size", "must be >= 1"));
        }

        if !(0.0..=1.0).contains(&self.signal.threshold) {
            return Err(invalid(
                "signal.threshold",
                format!("must be in [0, 1], got {}", self.signal.threshold),
            ));
        }

        if self.evaluation.signal_lag == 0 {
            return Err(invalid("evaluation.signal_lag", "must be >= 1"));
        }
        if !(self.evaluation.periods_per_year > 0.0) {
            return Err(invalid("evaluation.periods_per_year", "must be positive"));
        }

        Ok(())
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share the same hash.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.labels.horizon, 3);
        assert_eq!(config.selection.seed, 42);
        assert_eq!(config.signal.threshold, 0.6);
        assert_eq!(config.evaluation.signal_lag, 1);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [labels]
            horizon = 5

            [models.random_forest]
            n_trees = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.labels.horizon, 5);
        assert_eq!(config.labels.threshold, 0.005);
        assert_eq!(config.models.random_forest.n_trees, 25);
        assert_eq!(config.models.random_forest.max_depth, 10);
        assert_eq!(config.models.regularized_boosting.lambda, 1.0);
    }

    #[test]
    fn toml_round_trip() {
        let config = PipelineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_values() {
        for text in [
            "[labels]\nhorizon = 0",
            "[features]\nvolatility_window = 1",
            "[selection]\ntest_fraction = 1.0",
            "[selection]\ncv_folds = 1",
            "[selection]\nensemble_size = 0",
            "[signal]\nthreshold = 1.5",
            "[evaluation]\nsignal_lag = 0",
        ] {
            assert!(
                matches!(
                    PipelineConfig::from_toml_str(text),
                    Err(ConfigError::Invalid { .. })
                ),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(
            PipelineConfig::from_toml_str("[labels\nhorizon = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn config_hash_deterministic() {
        let config = PipelineConfig::default();
        let a = config.config_hash().unwrap();
        let b = config.config_hash().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn config_hash_changes_with_params() {
        let a = PipelineConfig::default();
        let mut b = a.clone();
        b.signal.threshold = 0.55;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = PipelineConfig::load(Path::new("/nonexistent/predictlab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
