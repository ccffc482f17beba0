//! Signal generator — ensemble probability to a per-bar long/flat decision.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use predictlab_core::features::FeatureTable;
use predictlab_core::models::{Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub bar_index: usize,
    /// P(up) from the ensemble.
    pub confidence: f64,
    /// 1 = long, 0 = flat.
    pub decision: u8,
}

/// One signal per feature row: decision = 1 iff probability > threshold.
pub fn generate(
    model: &dyn Classifier,
    features: &FeatureTable,
    threshold: f64,
) -> Result<Vec<Signal>, ModelError> {
    if features.is_empty() {
        return Ok(Vec::new());
    }
    let proba = model.predict_proba(&features.matrix())?;
    Ok(features
        .rows()
        .iter()
        .zip(proba)
        .map(|(row, p)| Signal {
            timestamp: row.timestamp,
            bar_index: row.bar_index,
            confidence: p,
            decision: u8::from(p > threshold),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use predictlab_core::features::{FeatureRow, FeatureVector};

    /// P(up) equals the row's rsi / 100.
    #[derive(Debug)]
    struct RsiProbability;

    impl Classifier for RsiProbability {
        fn name(&self) -> &str {
            "rsi_probability"
        }

        fn fit(&mut self, _: &[Vec<f64>], _: &[u8]) -> Result<(), ModelError> {
            Ok(())
        }

        fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(features.iter().map(|r| r[0] / 100.0).collect())
        }
    }

    fn table(rsis: &[f64]) -> FeatureTable {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        FeatureTable::new(
            rsis.iter()
                .enumerate()
                .map(|(i, &rsi)| FeatureRow {
                    bar_index: i + 20,
                    timestamp: base + chrono::Duration::hours(i as i64),
                    values: FeatureVector {
                        rsi,
                        ema: 100.0,
                        ema_slope: 0.0,
                        volatility: 1.0,
                        returns: 0.0,
                        hour: 9.0,
                        volume_change: 0.0,
                    },
                })
                .collect(),
        )
    }

    #[test]
    fn threshold_is_strict() {
        let signals = generate(&RsiProbability, &table(&[60.0, 61.0, 10.0]), 0.6).unwrap();
        let decisions: Vec<u8> = signals.iter().map(|s| s.decision).collect();
        assert_eq!(decisions, vec![0, 1, 0]);
        assert!((signals[1].confidence - 0.61).abs() < 1e-12);
    }

    #[test]
    fn one_signal_per_row_with_source_bar() {
        let features = table(&[50.0, 70.0]);
        let signals = generate(&RsiProbability, &features, 0.6).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].bar_index, 20);
        assert_eq!(signals[1].timestamp, features.rows()[1].timestamp);
    }

    #[test]
    fn empty_table_yields_no_signals() {
        let signals = generate(&RsiProbability, &FeatureTable::default(), 0.6).unwrap();
        assert!(signals.is_empty());
    }
}
