//! Stop trigger checks: does a bar touch a stop level, and at what price.
//!
//! Gap-through fills take the open (the worse side for the order), otherwise
//! the stop level itself.

use crate::domain::{Bar, Direction};

/// Side of a stop order as seen by the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSide {
    /// Triggers when price rises to the level.
    Buy,
    /// Triggers when price falls to the level.
    Sell,
}

impl StopSide {
    /// Side of the stop that opens a position in `direction`.
    pub fn entry(direction: Direction) -> Self {
        match direction {
            Direction::Long => StopSide::Buy,
            Direction::Short => StopSide::Sell,
        }
    }

    /// Side of the stop-loss protecting a position in `direction`.
    pub fn exit(direction: Direction) -> Self {
        match direction {
            Direction::Long => StopSide::Sell,
            Direction::Short => StopSide::Buy,
        }
    }
}

/// A triggered stop and its raw fill price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopFill {
    pub price: f64,
    /// The bar opened beyond the level.
    pub gap_through: bool,
}

/// Check whether a stop at `level` triggers on `bar`.
///
/// Buy stop: triggers if `high >= level`, fills at `max(open, level)`.
/// Sell stop: triggers if `low <= level`, fills at `min(open, level)`.
pub fn check_stop(side: StopSide, level: f64, bar: &Bar) -> Option<StopFill> {
    if bar.is_void() || !level.is_finite() {
        return None;
    }

    match side {
        StopSide::Buy if bar.high >= level => {
            let gap_through = bar.open >= level;
            Some(StopFill {
                price: if gap_through { bar.open } else { level },
                gap_through,
            })
        }
        StopSide::Sell if bar.low <= level => {
            let gap_through = bar.open <= level;
            Some(StopFill {
                price: if gap_through { bar.open } else { level },
                gap_through,
            })
        }
        _ => None,
    }
}
