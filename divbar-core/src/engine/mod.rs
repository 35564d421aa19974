//! Reference execution engine and the bar loop.
//!
//! The manager emits intents; the engine alone decides fills. `SimBroker`
//! is the in-crate `ExecutionEngine`: price-touch stop entries, stop-loss
//! exits, market-on-close reversals, whole-unit sizing and flat commission.

pub mod broker;
pub mod interface;
pub mod loop_runner;
pub mod state;
pub mod trigger;

pub use broker::{BrokerConfig, SimBroker};
pub use interface::{EngineError, EngineSnapshot, ExecutionEngine};
pub use loop_runner::{annotate_signals, run_backtest, RunError};
pub use state::{EngineConfig, RunCounters, RunResult};
pub use trigger::{check_stop, StopFill, StopSide};
