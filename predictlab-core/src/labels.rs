//! Label generator — attaches a forward-looking binary target to feature rows.
//!
//! target = 1 iff (close[i + horizon] - close[i]) / close[i] > threshold,
//! where i is the row's source bar index. Rows without a bar `horizon` steps
//! ahead are dropped.
//!
//! Targets are kept in their own column next to the feature table. The
//! feature matrix handed to classifiers is built from `FeatureTable` alone and
//! has no slot for a target.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::features::{FeatureRow, FeatureTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Bars between the current close and the reference close.
    pub horizon: usize,
    /// Minimum forward return (fraction) for a positive label.
    pub threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            horizon: 3,
            threshold: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabelError {
    #[error("label horizon must be >= 1")]
    ZeroHorizon,

    #[error("feature row references bar {bar_index} but only {available} closes were supplied")]
    BarOutOfRange { bar_index: usize, available: usize },
}

/// Feature rows paired with their targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledTable {
    features: FeatureTable,
    targets: Vec<u8>,
}

impl LabeledTable {
    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn targets(&self) -> &[u8] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Share of positive targets, 0 for an empty table.
    pub fn positive_rate(&self) -> f64 {
        if self.targets.is_empty() {
            return 0.0;
        }
        self.targets.iter().filter(|&&t| t == 1).count() as f64 / self.targets.len() as f64
    }

    /// Iterate over (row, target) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureRow, u8)> {
        self.features.rows().iter().zip(self.targets.iter().copied())
    }
}

/// Forward-return label for bar `i`, or `None` if bar `i + horizon` does not exist.
pub fn forward_label(closes: &[f64], i: usize, config: &LabelConfig) -> Option<u8> {
    let future = *closes.get(i.checked_add(config.horizon)?)?;
    let current = *closes.get(i)?;
    let forward_return = (future - current) / current;
    // NaN compares false, so an undefined return labels 0
    Some(u8::from(forward_return > config.threshold))
}

/// Attach targets to a feature table.
pub fn add_target(
    features: &FeatureTable,
    raw_closes: &[f64],
    config: &LabelConfig,
) -> Result<LabeledTable, LabelError> {
    if config.horizon == 0 {
        return Err(LabelError::ZeroHorizon);
    }

    let mut rows = Vec::with_capacity(features.len());
    let mut targets = Vec::with_capacity(features.len());

    for row in features.rows() {
        if row.bar_index >= raw_closes.len() {
            return Err(LabelError::BarOutOfRange {
                bar_index: row.bar_index,
                available: raw_closes.len(),
            });
        }
        if let Some(target) = forward_label(raw_closes, row.bar_index, config) {
            rows.push(row.clone());
            targets.push(target);
        }
    }

    debug!(
        rows = targets.len(),
        dropped = features.len() - targets.len(),
        horizon = config.horizon,
        "labels attached"
    );

    Ok(LabeledTable {
        features: FeatureTable::new(rows),
        targets,
    })
}
