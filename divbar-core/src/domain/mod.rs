//! Domain types for the divergent-bar engine.

pub mod bar;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::{validate_history, Bar, HistoryError};
pub use order::{crosses_cancel_threshold, Direction, PendingOrder};
pub use position::{Position, PositionSnapshot};
pub use trade::{ExitReason, TradeRecord};
