//! Direction and the pending stop-entry order.

use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// The single outstanding stop-entry order.
///
/// `cancel_threshold` is the watchdog level: if price retreats through it
/// before the order fills, the setup is stale and the order is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub direction: Direction,
    /// Trigger price: buy-stop for longs, sell-stop for shorts.
    pub stop_price: f64,
    /// Initial stop-loss attached to the position once filled.
    pub stop_loss: f64,
    pub cancel_threshold: f64,
    /// Bar index on which the order was placed. Never fills on this bar.
    pub placed_bar: usize,
}

impl PendingOrder {
    /// Whether `bar_low`/`bar_high` crossed the cancel threshold against the order.
    ///
    /// Long orders go stale when the low retreats to or below the threshold;
    /// short orders when the high rises to or above it.
    pub fn is_stale(&self, bar_low: f64, bar_high: f64) -> bool {
        crosses_cancel_threshold(self.direction, self.cancel_threshold, bar_low, bar_high)
    }
}

/// Whether a bar's extremes crossed `threshold` against an order in `direction`.
pub fn crosses_cancel_threshold(
    direction: Direction,
    threshold: f64,
    bar_low: f64,
    bar_high: f64,
) -> bool {
    match direction {
        Direction::Long => bar_low <= threshold,
        Direction::Short => bar_high >= threshold,
    }
}
