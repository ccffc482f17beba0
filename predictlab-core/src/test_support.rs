//! Shared fixtures for unit tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::PriceBar;

pub fn base_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Hourly bars from close prices.
///
/// open = prev close (or close for the first bar), high/low = ±1 around the
/// body, volume cycles through 1000..=1600.
pub fn hourly_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base_timestamp() + Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0 + (i % 7) as f64 * 100.0,
            }
        })
        .collect()
}

/// close[i] = 100 + i. Three-bar forward returns stay above 1% for the
/// first 200 bars.
pub fn linear_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

/// Deterministic zig-zag around 100 with both up and down moves.
pub fn wavy_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.35).sin() * 4.0 + (i as f64 * 1.7).cos())
        .collect()
}
