//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: finite prices, high >= low, open/close inside the range.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Median price: (high + low) / 2.
    pub fn median(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Bar range: high - low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Malformed history, rejected before the bar loop starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("bar {index} has invalid prices (open={open}, high={high}, low={low}, close={close})")]
    InvalidPrices {
        index: usize,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
    #[error("bar {index} at {timestamp} is not after the previous bar at {previous}")]
    NonMonotonic {
        index: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
}

/// Check that timestamps strictly increase and every bar is sane.
pub fn validate_history(bars: &[Bar]) -> Result<(), HistoryError> {
    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(HistoryError::InvalidPrices {
                index,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
            });
        }
        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(HistoryError::NonMonotonic {
                    index,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
    }
    Ok(())
}
