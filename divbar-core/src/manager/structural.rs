//! Structural stop levels from recent price extremes.
//!
//! long_level  = max(low over window)  - buffer
//! short_level = min(high over window) + buffer
//!
//! The window is the last `lookback` bars ending at the current bar,
//! truncated at the start of history.

use crate::domain::{Bar, Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuralLevels {
    pub long: f64,
    pub short: f64,
}

impl StructuralLevels {
    /// Levels for the window ending at `bar_index`. `None` if the window is
    /// empty or contains NaN.
    pub fn compute(bars: &[Bar], bar_index: usize, lookback: usize, buffer: f64) -> Option<Self> {
        if lookback == 0 || bar_index >= bars.len() {
            return None;
        }
        let start = (bar_index + 1).saturating_sub(lookback);
        let window = &bars[start..=bar_index];

        let mut max_low = f64::NEG_INFINITY;
        let mut min_high = f64::INFINITY;
        for bar in window {
            if bar.low.is_nan() || bar.high.is_nan() {
                return None;
            }
            max_low = max_low.max(bar.low);
            min_high = min_high.min(bar.high);
        }

        Some(Self {
            long: max_low - buffer,
            short: min_high + buffer,
        })
    }

    /// Level for the position's direction.
    pub fn for_direction(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.long,
            Direction::Short => self.short,
        }
    }

    /// The tightened stop for `position`, if the structural level already
    /// locks in profit and improves on the current stop.
    pub fn tightened_stop(&self, position: &Position) -> Option<f64> {
        let level = self.for_direction(position.direction);
        let improves = match position.direction {
            Direction::Long => level > position.entry_price && level > position.stop_loss,
            Direction::Short => level < position.entry_price && level < position.stop_loss,
        };
        improves.then_some(level)
    }
}
