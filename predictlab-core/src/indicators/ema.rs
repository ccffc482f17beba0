//! Exponential Moving Average (EMA) and its first difference.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA[period-1] = SMA of first `period` values.
//! Lookback: period - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let alpha = 2.0 / (self.period as f64 + 1.0);

        let mut sum = 0.0;
        for &v in values.iter().take(self.period) {
            if v.is_nan() {
                return result; // NaN in seed window → all NaN after seed
            }
            sum += v;
        }
        let seed = sum / self.period as f64;
        result[self.period - 1] = seed;

        let mut prev = seed;
        for i in self.period..n {
            if values[i].is_nan() {
                // once we see NaN, subsequent values are tainted
                return result;
            }
            let ema = alpha * values[i] + (1.0 - alpha) * prev;
            result[i] = ema;
            prev = ema;
        }

        result
    }
}

/// First difference: out[t] = x[t] - x[t-1], NaN at t = 0.
///
/// Used for the EMA slope feature.
pub fn diff(values: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        result[i] = values[i] - values[i - 1];
    }
    result
}
