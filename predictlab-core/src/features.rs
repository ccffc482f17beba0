//! Feature engine — raw price frame in, feature table out.
//!
//! Every feature at bar t is computed from bars 0..=t only. Warmup rows and
//! rows whose percent changes are not finite are dropped, so every surviving
//! row is complete and finite.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::frame::{CLOSE, VOLUME};
use crate::domain::PriceFrame;
use crate::indicators::{diff, Ema, Indicator, PctChange, RollingStd, Rsi};
use crate::schema::{self, SchemaError};

/// Feature column names, in matrix column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "rsi",
    "ema",
    "ema_slope",
    "volatility",
    "returns",
    "hour",
    "volume_change",
];

pub const FEATURE_COUNT: usize = 7;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid feature config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}

/// Window sizes and clip bounds for the feature engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub rsi_window: usize,
    pub ema_window: usize,
    pub volatility_window: usize,
    /// Close-to-close returns are clipped to ±this value.
    pub return_clip: f64,
    /// Volume percent changes are clipped to ±this value.
    pub volume_change_clip: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            ema_window: 20,
            volatility_window: 10,
            return_clip: 1.0,
            volume_change_clip: 10.0,
        }
    }
}

impl FeatureConfig {
    /// Reject windows and clip bounds the indicators cannot be built with.
    pub fn validate(&self) -> Result<(), FeatureError> {
        let invalid = |field, reason| Err(FeatureError::InvalidConfig { field, reason });
        if self.rsi_window == 0 {
            return invalid("features.rsi_window", "must be >= 1");
        }
        if self.ema_window == 0 {
            return invalid("features.ema_window", "must be >= 1");
        }
        if self.volatility_window < 2 {
            return invalid("features.volatility_window", "must be >= 2");
        }
        if !(self.return_clip > 0.0) {
            return invalid("features.return_clip", "must be positive");
        }
        if !(self.volume_change_clip > 0.0) {
            return invalid("features.volume_change_clip", "must be positive");
        }
        Ok(())
    }

    /// Number of leading bars that can never produce a complete row.
    pub fn warmup_bars(&self) -> usize {
        // ema slope needs one extra bar beyond the ema seed
        self.rsi_window
            .max(self.ema_window)
            .max(self.volatility_window.saturating_sub(1))
            .max(1)
    }
}

/// Derived values for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rsi: f64,
    pub ema: f64,
    pub ema_slope: f64,
    pub volatility: f64,
    pub returns: f64,
    pub hour: f64,
    pub volume_change: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.rsi,
            self.ema,
            self.ema_slope,
            self.volatility,
            self.returns,
            self.hour,
            self.volume_change,
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// A feature vector tagged with the bar it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Index of the source bar in the input frame.
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub values: FeatureVector,
}

/// Complete, finite feature rows in bar order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-major feature matrix in `FEATURE_NAMES` column order.
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|r| r.values.to_array().to_vec())
            .collect()
    }

    /// Keep only the rows accepted by `keep`, preserving order.
    pub fn filter(&self, mut keep: impl FnMut(&FeatureRow) -> bool) -> Self {
        Self {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// Compute the feature table for a price frame.
///
/// Fails with `FeatureError::InvalidConfig` before touching the frame if the
/// config is unusable, then with `FeatureError::Schema` if the frame breaks
/// the schema contract.
pub fn add_indicators(
    frame: &PriceFrame,
    config: &FeatureConfig,
) -> Result<FeatureTable, FeatureError> {
    config.validate()?;
    schema::validate(frame)?;

    let close = frame
        .column(CLOSE)
        .ok_or_else(|| SchemaError::MissingColumn(CLOSE.into()))?;
    let volume = frame
        .column(VOLUME)
        .ok_or_else(|| SchemaError::MissingColumn(VOLUME.into()))?;

    let rsi = Rsi::new(config.rsi_window).compute(close);
    let ema = Ema::new(config.ema_window).compute(close);
    let ema_slope = diff(&ema);
    let volatility = RollingStd::new(config.volatility_window).compute(close);
    let returns = PctChange::new(config.return_clip).compute(close);
    let volume_change = PctChange::new(config.volume_change_clip).compute(volume);

    let rows: Vec<FeatureRow> = frame
        .timestamps()
        .iter()
        .enumerate()
        .filter_map(|(i, &timestamp)| {
            let values = FeatureVector {
                rsi: rsi[i],
                ema: ema[i],
                ema_slope: ema_slope[i],
                volatility: volatility[i],
                returns: returns[i],
                hour: f64::from(timestamp.hour()),
                volume_change: volume_change[i],
            };
            values.is_complete().then_some(FeatureRow {
                bar_index: i,
                timestamp,
                values,
            })
        })
        .collect();

    debug!(
        bars = frame.len(),
        rows = rows.len(),
        dropped = frame.len() - rows.len(),
        "feature table built"
    );

    Ok(FeatureTable::new(rows))
}
