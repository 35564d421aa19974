//! Criterion benchmarks for the hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full backtest: precompute, detection, manager, broker)
//! 2. Indicator precompute (oscillator + envelope)
//! 3. Detector pass over a precomputed history
//! 4. Manager state machine (sequential on_bar calls)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use divbar_core::domain::Bar;
use divbar_core::engine::{run_backtest, EngineConfig, EngineSnapshot};
use divbar_core::indicators::{AwesomeOscillator, Envelope, Indicator, IndicatorSet};
use divbar_core::manager::OrderPositionManager;
use divbar_core::signal::DivergenceDetector;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let wave = (i as f64 * 0.1).sin() * 10.0 + (i as f64 * 0.37).cos() * 4.0;
            let close = 100.0 + wave;
            let open = close - (i as f64 * 0.7).sin() * 2.0;
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.5,
                low: open.min(close) - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500) as f64,
            }
        })
        .collect()
}

// ── 1. Bar Loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");
    let config = EngineConfig::default();

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        group.bench_with_input(BenchmarkId::new("run_backtest", bar_count), &bars, |b, bars| {
            b.iter(|| run_backtest(black_box(bars), black_box(&config)));
        });
    }

    group.finish();
}

// ── 2. Indicator Precompute ──────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        let oscillator = AwesomeOscillator::default_params();
        group.bench_with_input(BenchmarkId::new("oscillator_5_34", bar_count), &bars, |b, bars| {
            b.iter(|| oscillator.compute(black_box(bars)));
        });

        let upper = Envelope::upper();
        group.bench_with_input(BenchmarkId::new("envelope_upper", bar_count), &bars, |b, bars| {
            b.iter(|| upper.compute(black_box(bars)));
        });

        group.bench_with_input(BenchmarkId::new("full_set", bar_count), &bars, |b, bars| {
            b.iter(|| IndicatorSet::compute(black_box(bars)));
        });
    }

    group.finish();
}

// ── 3. Detection ─────────────────────────────────────────────────────

fn bench_detector(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector");
    let detector = DivergenceDetector::new();

    for &bar_count in &[1260, 2520] {
        let bars = make_bars(bar_count);
        let set = IndicatorSet::compute(&bars);
        group.bench_with_input(BenchmarkId::new("condition_matrix", bar_count), &bars, |b, bars| {
            b.iter(|| detector.condition_matrix(black_box(bars), black_box(&set)));
        });
    }

    group.finish();
}

// ── 4. Manager State Machine ─────────────────────────────────────────

fn bench_manager(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager");
    let bars = make_bars(2520);
    let set = IndicatorSet::compute(&bars);
    let signals = DivergenceDetector::new().detect_all(&bars, &set);
    let snapshot = EngineSnapshot::default();

    group.bench_function("on_bar_2520_flat_engine", |b| {
        b.iter(|| {
            let mut manager = OrderPositionManager::default();
            for (t, signal) in signals.iter().enumerate() {
                black_box(manager.on_bar(&bars, t, *signal, &snapshot));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_bar_loop,
    bench_indicators,
    bench_detector,
    bench_manager,
);
criterion_main!(benches);
