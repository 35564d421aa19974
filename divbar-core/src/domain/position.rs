use serde::{Deserialize, Serialize};

use super::order::Direction;

/// Open position tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_bar: usize,
    /// Current stop-loss. Only ever moves in the profit-protecting direction.
    pub stop_loss: f64,
    /// Whole units held (always positive; direction carries the sign).
    pub size: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.direction.sign() * self.size * (current_price - self.entry_price)
    }

    pub fn snapshot(&self, current_price: f64) -> PositionSnapshot {
        PositionSnapshot {
            position: *self,
            unrealized_pnl: self.unrealized_pnl(current_price),
        }
    }
}

/// A position as reported by the execution engine, marked to the last close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub position: Position,
    pub unrealized_pnl: f64,
}

impl PositionSnapshot {
    pub fn is_profitable(&self) -> bool {
        self.unrealized_pnl > 0.0
    }
}
