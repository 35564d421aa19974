//! Divergent-bar detector.
//!
//! Bullish: the bar closes in its upper half, opens below its close, makes a
//! 3-bar local low, sits entirely below the envelope, and the oscillator is
//! falling. Bearish is the mirror image.

use serde::{Deserialize, Serialize};

use super::Signal;
use crate::domain::Bar;
use crate::indicators::{IndicatorSet, MIN_LOOKBACK};

/// Number of prior bars the local extreme is compared against.
const LOCAL_EXTREME_BARS: usize = 3;

/// Every boolean condition the detector evaluates for one bar.
///
/// A fixed schema: the same named columns for every bar, used both to derive
/// the signal and to build per-condition diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRow {
    pub upper_half: bool,
    pub lower_half: bool,
    /// low < min(envelope lines)
    pub below_envelope: bool,
    /// high > max(envelope lines)
    pub above_envelope: bool,
    pub oscillator_falling: bool,
    pub oscillator_rising: bool,
    pub local_min: bool,
    pub local_max: bool,
    /// open < close
    pub bullish_candle: bool,
    /// open > close
    pub bearish_candle: bool,
    /// The bar's range does not intersect the envelope band.
    pub no_overlap: bool,
}

impl ConditionRow {
    /// Condition names in column order.
    pub const NAMES: [&'static str; 11] = [
        "upper_half",
        "lower_half",
        "below_envelope",
        "above_envelope",
        "oscillator_falling",
        "oscillator_rising",
        "local_min",
        "local_max",
        "bullish_candle",
        "bearish_candle",
        "no_overlap",
    ];

    /// Column values in the same order as [`ConditionRow::NAMES`].
    pub fn values(&self) -> [bool; 11] {
        [
            self.upper_half,
            self.lower_half,
            self.below_envelope,
            self.above_envelope,
            self.oscillator_falling,
            self.oscillator_rising,
            self.local_min,
            self.local_max,
            self.bullish_candle,
            self.bearish_candle,
            self.no_overlap,
        ]
    }

    pub fn is_bullish(&self) -> bool {
        self.upper_half
            && self.below_envelope
            && self.oscillator_falling
            && self.local_min
            && self.bullish_candle
            && self.no_overlap
    }

    pub fn is_bearish(&self) -> bool {
        self.lower_half
            && self.above_envelope
            && self.oscillator_rising
            && self.local_max
            && self.bearish_candle
            && self.no_overlap
    }

    /// Combine the conditions into a signal.
    ///
    /// `upper_half` and `lower_half` are mutually exclusive, so a row can
    /// never be both bullish and bearish.
    pub fn signal(&self) -> Signal {
        if self.is_bullish() {
            Signal::Bullish
        } else if self.is_bearish() {
            Signal::Bearish
        } else {
            Signal::None
        }
    }
}

/// Stateless divergent-bar detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct DivergenceDetector;

impl DivergenceDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "divergent_bar"
    }

    /// Number of bars needed before a signal can fire.
    pub fn warmup_bars(&self) -> usize {
        MIN_LOOKBACK
    }

    /// Evaluate every condition at `bar_index`.
    ///
    /// Returns `None` during warmup or when any input is undefined. Only
    /// `bars[..=bar_index]` is read.
    pub fn evaluate_conditions(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorSet,
    ) -> Option<ConditionRow> {
        if bar_index < self.warmup_bars() || bar_index >= bars.len() {
            return None;
        }

        let bar = &bars[bar_index];
        if bar.is_void() {
            return None;
        }

        let osc = indicators.oscillator_at(bar_index)?;
        let prev_osc = indicators.oscillator_at(bar_index - 1)?;
        let envelope = indicators.envelope_at(bar_index)?;
        let env_min = envelope.min();
        let env_max = envelope.max();

        let prior = &bars[bar_index - LOCAL_EXTREME_BARS..bar_index];
        // f64::min/max skip NaN, so a void bar would silently shrink the window.
        if prior.iter().any(Bar::is_void) {
            return None;
        }
        let prior_low = prior.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let prior_high = prior
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);

        let midpoint = bar.median();
        Some(ConditionRow {
            upper_half: bar.close > midpoint,
            lower_half: bar.close < midpoint,
            below_envelope: bar.low < env_min,
            above_envelope: bar.high > env_max,
            oscillator_falling: osc < prev_osc,
            oscillator_rising: osc > prev_osc,
            local_min: bar.low < prior_low,
            local_max: bar.high > prior_high,
            bullish_candle: bar.open < bar.close,
            bearish_candle: bar.open > bar.close,
            no_overlap: bar.high < env_min || bar.low > env_max,
        })
    }

    /// Signal at `bar_index`; undefined inputs yield `Signal::None`.
    pub fn evaluate(&self, bars: &[Bar], bar_index: usize, indicators: &IndicatorSet) -> Signal {
        self.evaluate_conditions(bars, bar_index, indicators)
            .map(|row| row.signal())
            .unwrap_or_default()
    }

    /// Signal for every bar of the history.
    pub fn detect_all(&self, bars: &[Bar], indicators: &IndicatorSet) -> Vec<Signal> {
        (0..bars.len())
            .map(|i| self.evaluate(bars, i, indicators))
            .collect()
    }

    /// Condition row for every bar (`None` where undefined).
    pub fn condition_matrix(
        &self,
        bars: &[Bar],
        indicators: &IndicatorSet,
    ) -> Vec<Option<ConditionRow>> {
        (0..bars.len())
            .map(|i| self.evaluate_conditions(bars, i, indicators))
            .collect()
    }
}
