//! Compact performance and trade context for the model.

use serde::{Deserialize, Serialize};

use divbar_core::domain::{Direction, TradeRecord};

use crate::metrics::PerformanceMetrics;

/// Trades sampled from each end of the return distribution.
pub const SAMPLE_TRADES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeContext {
    pub direction: Direction,
    pub entry_bar: usize,
    pub exit_bar: usize,
    pub pnl: f64,
    /// Net return as a fraction of entry notional.
    pub return_pct: f64,
    /// Bars held.
    pub duration: usize,
    pub entry_signal_val: i8,
    pub exit_signal_val: i8,
}

impl From<&TradeRecord> for TradeContext {
    fn from(t: &TradeRecord) -> Self {
        Self {
            direction: t.direction,
            entry_bar: t.entry_bar,
            exit_bar: t.exit_bar,
            pnl: t.net_pnl,
            return_pct: t.return_pct,
            duration: t.bars_held(),
            entry_signal_val: t.entry_signal,
            exit_signal_val: t.exit_signal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSlice {
    pub total_trades: usize,
    /// Percent.
    pub win_rate: f64,
    pub expectancy_pct: f64,
    pub max_dd_pct: f64,
    pub sharpe: f64,
}

impl From<&PerformanceMetrics> for PerformanceSlice {
    fn from(m: &PerformanceMetrics) -> Self {
        Self {
            total_trades: m.trade_count,
            win_rate: m.win_rate_pct,
            expectancy_pct: m.expectancy_pct,
            max_dd_pct: m.max_drawdown_pct,
            sharpe: m.sharpe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyContext {
    pub performance: PerformanceSlice,
    /// Best trades first.
    pub top_winners: Vec<TradeContext>,
    /// Worst trades first.
    pub top_losers: Vec<TradeContext>,
}

/// Performance slice plus the best and worst trades by return.
///
/// With fewer than ten trades the two samples overlap; both still hold up to
/// five trades each.
pub fn extract_context(metrics: &PerformanceMetrics, trades: &[TradeRecord]) -> StrategyContext {
    let mut sorted: Vec<&TradeRecord> = trades.iter().collect();
    sorted.sort_by(|a, b| a.return_pct.total_cmp(&b.return_pct));

    let take = SAMPLE_TRADES.min(sorted.len());
    let top_losers = sorted[..take].iter().map(|t| TradeContext::from(*t)).collect();
    let top_winners = sorted[sorted.len() - take..]
        .iter()
        .rev()
        .map(|t| TradeContext::from(*t))
        .collect();

    StrategyContext {
        performance: PerformanceSlice::from(metrics),
        top_winners,
        top_losers,
    }
}
