//! The seam between the manager and whatever executes its intents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, PendingOrder, PositionSnapshot};
use crate::manager::ManagerAction;

/// The engine's authoritative order/position state after a bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub position: Option<PositionSnapshot>,
    pub pending: Option<PendingOrder>,
}

impl EngineSnapshot {
    pub fn is_flat(&self) -> bool {
        self.position.is_none() && self.pending.is_none()
    }
}

/// Actions the engine refuses to apply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("bar {bar_index}: cannot place an order while another is pending")]
    OrderAlreadyPending { bar_index: usize },

    #[error("bar {bar_index}: cannot place an entry order while a position is open")]
    PositionAlreadyOpen { bar_index: usize },

    #[error("bar {bar_index}: no pending order to cancel")]
    NoPendingOrder { bar_index: usize },

    #[error("bar {bar_index}: no open position for {action}")]
    NoOpenPosition {
        bar_index: usize,
        action: &'static str,
    },

    #[error("bar {bar_index}: stop-loss {stop_loss} would loosen the stop at {current}")]
    StopLoosened {
        bar_index: usize,
        stop_loss: f64,
        current: f64,
    },
}

/// Executes manager intents and decides fills.
///
/// Per bar the loop calls `process_bar` first, then hands `snapshot()` to the
/// manager and applies each returned action in order.
pub trait ExecutionEngine {
    fn snapshot(&self) -> EngineSnapshot;

    /// Resolve fills (stop-loss exits, then pending entries) on `bar`.
    fn process_bar(&mut self, bar_index: usize, bar: &Bar);

    fn apply(
        &mut self,
        action: &ManagerAction,
        bar_index: usize,
        bar: &Bar,
    ) -> Result<(), EngineError>;
}
