//! Engine configuration and run result types.

use serde::{Deserialize, Serialize};

use super::broker::BrokerConfig;
use crate::domain::TradeRecord;
use crate::manager::{ManagerConfig, ManagerStats};
use crate::signal::{ConditionRow, Signal};

/// Configuration for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Fraction of notional charged per fill.
    pub commission_rate: f64,
    /// Fraction of equity to allocate per position.
    pub position_size_pct: f64,
    pub manager: ManagerConfig,
}

impl EngineConfig {
    pub fn new(initial_capital: f64, commission_rate: f64) -> Self {
        Self {
            initial_capital,
            commission_rate,
            ..Default::default()
        }
    }

    pub fn broker(&self) -> BrokerConfig {
        BrokerConfig {
            initial_capital: self.initial_capital,
            commission_rate: self.commission_rate,
            position_size_pct: self.position_size_pct,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let broker = BrokerConfig::default();
        Self {
            initial_capital: broker.initial_capital,
            commission_rate: broker.commission_rate,
            position_size_pct: broker.position_size_pct,
            manager: ManagerConfig::default(),
        }
    }
}

/// Event counts accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub bullish_signals: usize,
    pub bearish_signals: usize,
    #[serde(flatten)]
    pub manager: ManagerStats,
    /// Triggered entries dropped because they sized to zero units.
    pub dropped_orders: usize,
}

impl RunCounters {
    pub fn signals(&self) -> usize {
        self.bullish_signals + self.bearish_signals
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Equity value at each bar close.
    pub equity_curve: Vec<f64>,
    /// Completed round-trip trades, in exit order.
    pub trades: Vec<TradeRecord>,
    /// Detector output per bar.
    pub signals: Vec<Signal>,
    /// Condition row per bar (`None` during warmup).
    pub conditions: Vec<Option<ConditionRow>>,
    pub counters: RunCounters,
    pub final_equity: f64,
    pub bar_count: usize,
    /// Bars before the first possible signal.
    pub warmup_bars: usize,
}
