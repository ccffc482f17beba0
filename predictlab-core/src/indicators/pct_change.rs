//! One-bar percent change with a symmetric clip.
//!
//! PCT[t] = (x[t] - x[t-1]) / x[t-1], clipped to [-clip, clip].
//! Lookback: 1.
//! Edge cases: a non-finite quotient (x[t-1] == 0, NaN input) is NaN, never
//! clipped into range.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct PctChange {
    clip: f64,
    name: String,
}

impl PctChange {
    pub fn new(clip: f64) -> Self {
        assert!(clip > 0.0, "pct change clip must be > 0");
        Self {
            clip,
            name: format!("pct_change_clip_{clip}"),
        }
    }

    /// Percent change without clipping.
    pub fn unclipped() -> Self {
        Self {
            clip: f64::INFINITY,
            name: "pct_change".to_string(),
        }
    }
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        for i in 1..n {
            let change = (values[i] - values[i - 1]) / values[i - 1];
            if change.is_finite() {
                result[i] = change.clamp(-self.clip, self.clip);
            }
        }

        result
    }
}
