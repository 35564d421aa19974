//! Indicator engine: the momentum oscillator and the three-line trend envelope.
//!
//! Indicators are pure functions: bar history in, numeric series out. They are
//! precomputed once before the bar loop. The value at bar `t` depends only on
//! `bars[..=t]`, so precomputing over the full history is equivalent to
//! recomputing over the window ending at each bar.
//!
//! Undefined values (warmup, shifted leading edge) are `f64::NAN` in the raw
//! series and `None` through the [`IndicatorSet`] accessors.

pub mod envelope;
pub mod oscillator;
pub mod set;
pub mod sma;

pub use envelope::{Envelope, EnvelopeLine};
pub use oscillator::AwesomeOscillator;
pub use set::{EnvelopePoint, IndicatorSet};
pub use sma::{rolling_mean, shift_forward, Sma};

use crate::domain::Bar;

/// Slow oscillator window. No bar before this index can carry a signal.
pub const MIN_LOOKBACK: usize = 34;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "oscillator_5_34", "envelope_upper").
    fn name(&self) -> &str;

    /// Number of leading bars with undefined output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
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
