//! Property tests for evaluation and selection invariants.
//!
//! Uses proptest to verify:
//! 1. Lag property — strategy return at t is market return at t × decision at t−1
//! 2. Sharpe is 0 (never NaN, never a panic) for zero-variance returns
//! 3. Split and fold bookkeeping — disjoint, complete, stratified
//! 4. Metrics stay finite and in range

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use predictlab_runner::config::EvaluationConfig;
use predictlab_runner::evaluator::evaluate;
use predictlab_runner::metrics::{sharpe_ratio, volatility, win_rate};
use predictlab_runner::selector::{stratified_folds, train_test_split};
use predictlab_runner::signal::Signal;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_path() -> impl Strategy<Value = (Vec<f64>, Vec<u8>)> {
    prop::collection::vec((-0.05..0.05_f64, 0u8..2), 2..120).prop_map(|steps| {
        let mut price = 100.0;
        let mut closes = Vec::with_capacity(steps.len());
        let mut decisions = Vec::with_capacity(steps.len());
        for (r, d) in steps {
            price *= 1.0 + r;
            closes.push(price);
            decisions.push(d);
        }
        (closes, decisions)
    })
}

fn signals(decisions: &[u8]) -> Vec<Signal> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    decisions
        .iter()
        .enumerate()
        .map(|(i, &d)| Signal {
            timestamp: base + Duration::hours(i as i64),
            bar_index: i,
            confidence: f64::from(d),
            decision: d,
        })
        .collect()
}

// ── 1. Lag property ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn strategy_uses_only_prior_decision((closes, decisions) in arb_path()) {
        let report = evaluate(&closes, &signals(&decisions), &EvaluationConfig::default()).unwrap();
        prop_assert_eq!(report.records.len(), closes.len());
        prop_assert!(report.records[0].strategy_return.is_none());
        for t in 1..closes.len() {
            let market = report.records[t].market_return.unwrap();
            let strategy = report.records[t].strategy_return.unwrap();
            prop_assert_eq!(strategy, market * f64::from(decisions[t - 1]));
        }
    }

    /// Flipping the decision at the last row never changes any return.
    #[test]
    fn last_decision_is_never_traded((closes, decisions) in arb_path()) {
        let mut flipped = decisions.clone();
        let last = flipped.len() - 1;
        flipped[last] = 1 - flipped[last];
        let config = EvaluationConfig::default();
        let a = evaluate(&closes, &signals(&decisions), &config).unwrap();
        let b = evaluate(&closes, &signals(&flipped), &config).unwrap();
        prop_assert_eq!(a.metrics, b.metrics);
    }
}

// ── 2. Zero variance ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn sharpe_zero_for_constant_returns(k in -100i32..100, n in 0usize..200) {
        // dyadic values keep the running sum exact
        let returns = vec![f64::from(k) / 1024.0; n];
        let s = sharpe_ratio(&returns, 252.0);
        prop_assert!(s.is_finite());
        prop_assert_eq!(s, 0.0);
    }
}

// ── 3. Split and folds ───────────────────────────────────────────────

proptest! {
    #[test]
    fn split_is_a_partition(n in 1usize..500, fraction in 0.05..0.95_f64, seed in any::<u64>()) {
        let (train, test) = train_test_split(n, fraction, seed);
        prop_assert_eq!(test.len(), ((n as f64 * fraction).ceil() as usize).min(n));
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn folds_balance_each_class(labels in prop::collection::vec(0u8..2, 10..300), k in 2usize..8) {
        let folds = stratified_folds(&labels, k);
        prop_assert_eq!(folds.len(), k);
        for class in [0u8, 1] {
            let counts: Vec<usize> = folds
                .iter()
                .map(|f| f.iter().filter(|&&i| labels[i] == class).count())
                .collect();
            let spread = counts.iter().max().unwrap() - counts.iter().min().unwrap();
            prop_assert!(spread <= 1, "class {} spread {}", class, spread);
        }
        prop_assert_eq!(folds.iter().map(Vec::len).sum::<usize>(), labels.len());
    }
}

// ── 4. Metric ranges ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn metrics_finite_and_bounded(returns in prop::collection::vec(-0.2..0.2_f64, 0..200)) {
        let v = volatility(&returns, 252.0);
        let s = sharpe_ratio(&returns, 252.0);
        let w = win_rate(&returns);
        prop_assert!(v.is_finite() && v >= 0.0);
        prop_assert!(s.is_finite());
        prop_assert!((0.0..=1.0).contains(&w));
    }
}
