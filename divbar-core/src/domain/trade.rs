//! Closed round-trip trade record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::order::Direction;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    Reversal,
    EndOfData,
}

/// A closed round-trip trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub direction: Direction,
    pub size: f64,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    /// Stop-loss in force when the trade closed.
    pub stop_loss: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
    /// Net PnL as a fraction of entry notional.
    pub return_pct: f64,

    // ── Signal traceability ──
    /// Divergent-bar value (1, -1, 0) on the entry bar.
    pub entry_signal: i8,
    /// Divergent-bar value on the exit bar.
    pub exit_signal: i8,
}

impl TradeRecord {
    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}
