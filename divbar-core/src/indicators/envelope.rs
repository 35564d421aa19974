//! Alligator-style trend envelope: three lagged SMAs of close.
//!
//! Produces three series (exposed as separate Indicator instances):
//! - Upper:  SMA(close, 13) shifted forward 8 bars
//! - Middle: SMA(close, 8)  shifted forward 5 bars
//! - Lower:  SMA(close, 5)  shifted forward 3 bars
//!
//! The shift is part of the strategy: the line at bar t reports the mean as
//! of bar t - shift. Lookback: window - 1 + shift.

use super::sma::{rolling_mean, shift_forward};
use super::Indicator;
use crate::domain::Bar;

/// Which line of the envelope to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeLine {
    Upper,
    Middle,
    Lower,
}

impl EnvelopeLine {
    /// (window, shift) pair for this line.
    pub fn params(self) -> (usize, usize) {
        match self {
            EnvelopeLine::Upper => (13, 8),
            EnvelopeLine::Middle => (8, 5),
            EnvelopeLine::Lower => (5, 3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    line: EnvelopeLine,
    window: usize,
    shift: usize,
    name: String,
}

impl Envelope {
    pub fn new(line: EnvelopeLine) -> Self {
        let (window, shift) = line.params();
        let label = match line {
            EnvelopeLine::Upper => "upper",
            EnvelopeLine::Middle => "middle",
            EnvelopeLine::Lower => "lower",
        };
        Self {
            line,
            window,
            shift,
            name: format!("envelope_{label}_{window}_{shift}"),
        }
    }

    pub fn upper() -> Self {
        Self::new(EnvelopeLine::Upper)
    }

    pub fn middle() -> Self {
        Self::new(EnvelopeLine::Middle)
    }

    pub fn lower() -> Self {
        Self::new(EnvelopeLine::Lower)
    }

    pub fn line(&self) -> EnvelopeLine {
        self.line
    }
}

impl Indicator for Envelope {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1 + self.shift
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        shift_forward(&rolling_mean(&closes, self.window), self.shift)
    }
}
