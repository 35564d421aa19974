//! Precomputed oscillator + envelope series for one bar history.

use serde::{Deserialize, Serialize};

use super::{AwesomeOscillator, Envelope, Indicator};
use crate::domain::Bar;

/// The three envelope lines at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl EnvelopePoint {
    pub fn min(&self) -> f64 {
        self.upper.min(self.middle).min(self.lower)
    }

    pub fn max(&self) -> f64 {
        self.upper.max(self.middle).max(self.lower)
    }
}

/// Oscillator and envelope series, one value per bar.
///
/// Built once before the bar loop, then queried by bar index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub oscillator: Vec<f64>,
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl IndicatorSet {
    /// Compute every series over `bars`.
    pub fn compute(bars: &[Bar]) -> Self {
        Self {
            oscillator: AwesomeOscillator::default_params().compute(bars),
            upper: Envelope::upper().compute(bars),
            middle: Envelope::middle().compute(bars),
            lower: Envelope::lower().compute(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.oscillator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oscillator.is_empty()
    }

    /// Oscillator value at `bar_index`, `None` when undefined or out of range.
    pub fn oscillator_at(&self, bar_index: usize) -> Option<f64> {
        self.oscillator
            .get(bar_index)
            .copied()
            .filter(|v| !v.is_nan())
    }

    /// Envelope lines at `bar_index`, `None` unless all three are defined.
    pub fn envelope_at(&self, bar_index: usize) -> Option<EnvelopePoint> {
        let upper = self.upper.get(bar_index).copied()?;
        let middle = self.middle.get(bar_index).copied()?;
        let lower = self.lower.get(bar_index).copied()?;
        if upper.is_nan() || middle.is_nan() || lower.is_nan() {
            return None;
        }
        Some(EnvelopePoint {
            upper,
            middle,
            lower,
        })
    }
}
