//! Criterion benchmarks for PredictLab core hot paths.
//!
//! Benchmarks:
//! 1. Feature engine (indicators + row assembly)
//! 2. Label attachment
//! 3. Candidate fitting (one fit per algorithm)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use predictlab_core::domain::{PriceBar, PriceFrame};
use predictlab_core::features::{add_indicators, FeatureConfig};
use predictlab_core::labels::{add_target, LabelConfig};
use predictlab_core::models::{CandidateKind, ModelConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + (i as f64 * 0.37).cos();
            PriceBar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500) as f64 * 1_000.0,
            }
        })
        .collect()
}

// ── 1. Feature engine ────────────────────────────────────────────────

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");
    let config = FeatureConfig::default();
    for &n in &[1_000usize, 10_000] {
        let frame = PriceFrame::from_bars(&make_bars(n));
        group.bench_with_input(BenchmarkId::new("add_indicators", n), &frame, |b, frame| {
            b.iter(|| add_indicators(black_box(frame), &config))
        });
    }
    group.finish();
}

// ── 2. Labels ────────────────────────────────────────────────────────

fn bench_labels(c: &mut Criterion) {
    let bars = make_bars(10_000);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let table = add_indicators(&PriceFrame::from_bars(&bars), &FeatureConfig::default())
        .expect("features");
    let config = LabelConfig::default();
    c.bench_function("labels/add_target_10k", |b| {
        b.iter(|| add_target(black_box(&table), black_box(&closes), &config))
    });
}

// ── 3. Candidate fitting ─────────────────────────────────────────────

fn bench_fit(c: &mut Criterion) {
    let bars = make_bars(2_000);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let table = add_indicators(&PriceFrame::from_bars(&bars), &FeatureConfig::default())
        .expect("features");
    let labeled = add_target(&table, &closes, &LabelConfig::default()).expect("labels");
    let x = labeled.features().matrix();
    let y = labeled.targets().to_vec();
    let config = ModelConfig::default();

    let mut group = c.benchmark_group("fit");
    group.sample_size(10);
    for kind in CandidateKind::ALL {
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let mut model = kind.build(&config, 42);
                model.fit(black_box(&x), black_box(&y))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_features, bench_labels, bench_fit);
criterion_main!(benches);
