//! Intents emitted by the manager for the execution engine.

use serde::{Deserialize, Serialize};

use crate::domain::PendingOrder;

/// One order/position mutation, applied by the engine on the same bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManagerAction {
    /// Submit a stop-entry order.
    PlaceStopEntry(PendingOrder),
    /// Cancel the outstanding stop-entry order.
    CancelOrder,
    /// Close the open position at the current bar's close.
    ClosePosition,
    /// Move the open position's stop-loss.
    SetStopLoss { stop_loss: f64 },
}

/// Coarse manager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    Flat,
    PendingEntry,
    InPosition,
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStats {
    pub orders_placed: usize,
    /// Pending orders cancelled because price crossed the cancel threshold.
    pub cancelled_stale: usize,
    /// Pending orders cancelled because a newer signal fired.
    pub cancelled_superseded: usize,
    pub reversals: usize,
    pub stop_adjustments: usize,
    /// Bars on which the engine's snapshot disagreed with the cached state.
    pub resyncs: usize,
}
