//! Performance evaluator — strategy vs. buy-and-hold on the signalled bars.
//!
//! Returns are taken between consecutive signal rows. The strategy earns the
//! market return at row t only if the decision at row t − lag was long, so a
//! decision never trades on the bar it was computed from.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EvaluationConfig;
use crate::metrics::{cumulative, sharpe_ratio, total_return, volatility, win_rate};
use crate::signal::Signal;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("{closes} closes but {signals} signals")]
    LengthMismatch { closes: usize, signals: usize },
}

/// One row of the per-bar result table.
///
/// Return fields are `None` on the first row, where no prior close exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    pub timestamp: NaiveDateTime,
    pub bar_index: usize,
    pub close: f64,
    pub signal: u8,
    pub confidence: f64,
    #[serde(rename = "returns")]
    pub market_return: Option<f64>,
    #[serde(rename = "strategy")]
    pub strategy_return: Option<f64>,
    #[serde(rename = "cumulative_returns")]
    pub cumulative_market: Option<f64>,
    pub cumulative_strategy: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_return: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub win_rate: f64,
}

impl SummaryMetrics {
    pub fn compute(returns: &[f64], periods_per_year: f64) -> Self {
        Self {
            total_return: total_return(returns),
            volatility: volatility(returns, periods_per_year),
            sharpe: sharpe_ratio(returns, periods_per_year),
            win_rate: win_rate(returns),
        }
    }
}

/// One formatted row of the metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub metric: String,
    pub strategy: String,
    pub market: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    pub strategy: SummaryMetrics,
    pub market: SummaryMetrics,
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

impl MetricsTable {
    pub const ROW_NAMES: [&'static str; 4] =
        ["Total Return", "Volatility", "Sharpe Ratio", "Win Rate"];

    /// Rows in display order; percentages as `12.34%`, Sharpe as `1.23`.
    pub fn rows(&self) -> Vec<MetricRow> {
        let s = &self.strategy;
        let m = &self.market;
        let cells = [
            (percent(s.total_return), percent(m.total_return)),
            (percent(s.volatility), percent(m.volatility)),
            (format!("{:.2}", s.sharpe), format!("{:.2}", m.sharpe)),
            (percent(s.win_rate), percent(m.win_rate)),
        ];
        Self::ROW_NAMES
            .iter()
            .zip(cells)
            .map(|(name, (strategy, market))| MetricRow {
                metric: (*name).to_string(),
                strategy,
                market,
            })
            .collect()
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<14} {:>12} {:>12}", "Metric", "Strategy", "Market")?;
        for row in self.rows() {
            writeln!(f, "{:<14} {:>12} {:>12}", row.metric, row.strategy, row.market)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub records: Vec<BarRecord>,
    pub metrics: MetricsTable,
}

/// Score the signalled strategy against holding the asset.
///
/// `closes[t]` is the close of the bar behind `signals[t]`.
pub fn evaluate(
    closes: &[f64],
    signals: &[Signal],
    config: &EvaluationConfig,
) -> Result<BacktestReport, EvaluationError> {
    if closes.len() != signals.len() {
        return Err(EvaluationError::LengthMismatch {
            closes: closes.len(),
            signals: signals.len(),
        });
    }
    let lag = config.signal_lag.max(1);

    let market: Vec<Option<f64>> = (0..closes.len())
        .map(|t| (t > 0).then(|| closes[t] / closes[t - 1] - 1.0))
        .collect();
    let strategy: Vec<Option<f64>> = market
        .iter()
        .enumerate()
        .map(|(t, r)| {
            r.map(|r| match t.checked_sub(lag) {
                Some(prev) => r * f64::from(signals[prev].decision),
                None => 0.0,
            })
        })
        .collect();

    let market_defined: Vec<f64> = market.iter().flatten().copied().collect();
    let strategy_defined: Vec<f64> = strategy.iter().flatten().copied().collect();
    let cum_market = cumulative(&market_defined);
    let cum_strategy = cumulative(&strategy_defined);

    let records = signals
        .iter()
        .enumerate()
        .map(|(t, s)| BarRecord {
            timestamp: s.timestamp,
            bar_index: s.bar_index,
            close: closes[t],
            signal: s.decision,
            confidence: s.confidence,
            market_return: market[t],
            strategy_return: strategy[t],
            // defined returns start at row 1
            cumulative_market: t.checked_sub(1).map(|k| cum_market[k]),
            cumulative_strategy: t.checked_sub(1).map(|k| cum_strategy[k]),
        })
        .collect();

    let metrics = MetricsTable {
        strategy: SummaryMetrics::compute(&strategy_defined, config.periods_per_year),
        market: SummaryMetrics::compute(&market_defined, config.periods_per_year),
    };

    Ok(BacktestReport { records, metrics })
}
