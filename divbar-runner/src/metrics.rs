//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! Percent-valued fields carry a `_pct` suffix and are scaled by 100.

use serde::{Deserialize, Serialize};

use divbar_core::domain::TradeRecord;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub win_rate_pct: f64,
    /// Mean trade return, in percent.
    pub expectancy_pct: f64,
    /// Final equity over initial capital, minus one (fraction).
    pub total_return: f64,
    /// Largest peak-to-trough equity decline, as a negative percent.
    pub max_drawdown_pct: f64,
    /// Annualised (252 bars per year) Sharpe of per-bar equity returns.
    pub sharpe: f64,
    pub profit_factor: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_bars_held: f64,
    pub max_consecutive_losses: usize,
    pub final_equity: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve and trade list.
    pub fn compute(equity_curve: &[f64], trades: &[TradeRecord], initial_capital: f64) -> Self {
        let final_equity = equity_curve.last().copied().unwrap_or(initial_capital);
        Self {
            trade_count: trades.len(),
            win_rate_pct: win_rate(trades) * 100.0,
            expectancy_pct: expectancy(trades) * 100.0,
            total_return: total_return(initial_capital, final_equity),
            max_drawdown_pct: max_drawdown(initial_capital, equity_curve) * 100.0,
            sharpe: sharpe_ratio(equity_curve, 0.0),
            profit_factor: profit_factor(trades),
            best_trade_pct: trades
                .iter()
                .map(|t| t.return_pct * 100.0)
                .fold(0.0, f64::max),
            worst_trade_pct: trades
                .iter()
                .map(|t| t.return_pct * 100.0)
                .fold(0.0, f64::min),
            avg_bars_held: avg_bars_held(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
            final_equity,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial_capital: f64, final_equity: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_equity - initial_capital) / initial_capital
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(returns - rf) / std(returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 bars.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let bar_rf = risk_free_rate / 252.0;
    let excess: Vec<f64> = returns.iter().map(|r| r - bar_rf).collect();
    let mean = mean_f64(&excess);
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * (252.0_f64).sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// The running peak starts at the initial capital. Returns 0.0 for a curve
/// that never dips below its running peak.
pub fn max_drawdown(initial_capital: f64, equity_curve: &[f64]) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate: fraction of trades with positive net PnL.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Mean per-trade return (fraction of entry notional).
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();
    mean_f64(&returns)
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn avg_bars_held(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.bars_held()).sum::<usize>() as f64 / trades.len() as f64
}

/// Maximum consecutive losing (non-winning) trades.
pub fn max_consecutive_losses(trades: &[TradeRecord]) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for trade in trades {
        if !trade.is_winner() {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-bar simple returns from an equity curve.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
