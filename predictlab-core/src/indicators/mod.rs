//! Indicator trait and concrete implementations.
//!
//! Indicators are pure functions: a price series in, a numeric series of the
//! same length out. They are computed once over the whole history by the
//! feature engine.
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on data from bar t+1 or later.
//! Every indicator must pass the truncated-vs-full series test.

pub mod ema;
pub mod pct_change;
pub mod rolling_std;
pub mod rsi;

pub use ema::{diff, Ema};
pub use pct_change::PctChange;
pub use rolling_std::RollingStd;
pub use rsi::Rsi;

pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading values that are `f64::NAN` (warmup).
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `values`.
    fn compute(&self, values: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
