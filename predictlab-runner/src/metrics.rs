//! Performance metrics — pure functions over a per-bar return series.
//!
//! Every metric takes a slice of simple returns and yields a scalar. Returns
//! that are undefined (the first bar) are excluded before these are called.

/// Compounded total return: Π(1 + r) − 1. 0 for an empty series.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Running product of (1 + r), starting from 1 before the first return.
pub fn cumulative(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

/// Annualized volatility: sample std × sqrt(periods_per_year).
///
/// Returns 0.0 for fewer than 2 returns.
pub fn volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(returns) * periods_per_year.sqrt()
}

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// Sharpe = mean(r) / std(r) × sqrt(periods_per_year).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(returns) / std) * periods_per_year.sqrt()
}

/// Win rate: fraction of strictly positive returns.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let winners = returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / returns.len() as f64
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn total_return_compounds() {
        assert!(approx(total_return(&[0.1, 0.1]), 0.21));
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn cumulative_is_running_product() {
        let c = cumulative(&[0.1, -0.5, 0.0]);
        assert!(approx(c[0], 1.1));
        assert!(approx(c[1], 0.55));
        assert!(approx(c[2], 0.55));
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        // mean 2, squared deviations 1 + 0 + 1, ddof 1 → var 1
        assert!(approx(std_dev(&[1.0, 2.0, 3.0]), 1.0));
        assert_eq!(std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn sharpe_zero_for_constant_returns() {
        assert_eq!(sharpe_ratio(&[0.01; 50], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.0; 50], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.02], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[], 252.0), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 0.02, std 0.01 (ddof 1) → 2 × sqrt(4)
        let s = sharpe_ratio(&[0.01, 0.02, 0.03], 4.0);
        assert!(approx(s, 4.0));
    }

    #[test]
    fn volatility_annualizes() {
        assert!(approx(volatility(&[1.0, 2.0, 3.0], 9.0), 3.0));
        assert_eq!(volatility(&[0.0; 10], 252.0), 0.0);
    }

    #[test]
    fn win_rate_counts_strict_gains() {
        assert_eq!(win_rate(&[0.1, 0.0, -0.1, 0.2]), 0.5);
        assert_eq!(win_rate(&[]), 0.0);
    }
}
