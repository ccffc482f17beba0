//! Rolling sample standard deviation (ddof = 1).
//!
//! out[t] = std(x[t-period+1 ..= t])
//! Lookback: period - 1. A NaN inside the window makes that value NaN.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct RollingStd {
    period: usize,
    name: String,
}

impl RollingStd {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "rolling std period must be >= 2");
        Self {
            period,
            name: format!("std_{period}"),
        }
    }
}

impl Indicator for RollingStd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for (i, window) in values.windows(self.period).enumerate() {
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            let mean = window.iter().sum::<f64>() / self.period as f64;
            let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (self.period - 1) as f64;
            result[i + self.period - 1] = var.sqrt();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn std_known_values() {
        // window [2,4,4,4,5,5,7,9]: mean 5, sum sq dev 32, sample var 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = RollingStd::new(8).compute(&values);
        assert!(result[..7].iter().all(|v| v.is_nan()));
        assert_approx(result[7], (32.0_f64 / 7.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn std_of_constant_is_zero() {
        let result = RollingStd::new(3).compute(&[5.0; 6]);
        for v in &result[2..] {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn std_nan_window_only_affects_covering_values() {
        let result = RollingStd::new(2).compute(&[1.0, 2.0, f64::NAN, 4.0, 6.0]);
        assert_approx(result[1], std::f64::consts::FRAC_1_SQRT_2, DEFAULT_EPSILON);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert_approx(result[4], 2.0_f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn std_lookback() {
        assert_eq!(RollingStd::new(10).lookback(), 9);
    }
}
