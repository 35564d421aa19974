//! Bar-by-bar loop wiring the detector, the manager and the broker.
//!
//! Per bar:
//! 1. Broker resolves fills (stop-loss exits, then pending entries)
//! 2. Equity is marked at the close
//! 3. Manager resyncs from the broker snapshot and decides actions
//! 4. Broker applies the actions before the next bar

use thiserror::Error;
use tracing::info;

use super::broker::SimBroker;
use super::interface::{EngineError, ExecutionEngine};
use super::state::{EngineConfig, RunCounters, RunResult};
use crate::domain::{validate_history, Bar, HistoryError, TradeRecord};
use crate::indicators::IndicatorSet;
use crate::manager::OrderPositionManager;
use crate::signal::{DivergenceDetector, Signal};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("invalid history: {0}")]
    History(#[from] HistoryError),

    #[error("engine rejected action: {0}")]
    Engine(#[from] EngineError),
}

/// Run a backtest over `bars`.
///
/// Indicators and signals are precomputed once; every value at bar `t`
/// depends only on `bars[..=t]`, so this matches per-bar recomputation.
pub fn run_backtest(bars: &[Bar], config: &EngineConfig) -> Result<RunResult, RunError> {
    validate_history(bars)?;

    let detector = DivergenceDetector::new();
    let indicators = IndicatorSet::compute(bars);
    let conditions = detector.condition_matrix(bars, &indicators);
    let signals: Vec<Signal> = conditions
        .iter()
        .map(|row| row.map(|r| r.signal()).unwrap_or_default())
        .collect();

    let mut broker = SimBroker::new(config.broker());
    let mut manager = OrderPositionManager::new(config.manager);
    let mut equity_curve = Vec::with_capacity(bars.len());

    for (t, bar) in bars.iter().enumerate() {
        broker.process_bar(t, bar);
        equity_curve.push(broker.mark(bar));

        let snapshot = broker.snapshot();
        let actions = manager.on_bar(bars, t, signals[t], &snapshot);
        for action in &actions {
            broker.apply(action, t, bar)?;
        }
    }

    if let Some(last) = bars.len().checked_sub(1) {
        broker.finalize(last, &bars[last]);
        if let Some(point) = equity_curve.last_mut() {
            *point = broker.equity();
        }
    }

    let counters = RunCounters {
        bullish_signals: signals.iter().filter(|s| **s == Signal::Bullish).count(),
        bearish_signals: signals.iter().filter(|s| **s == Signal::Bearish).count(),
        manager: *manager.stats(),
        dropped_orders: broker.dropped_orders(),
    };
    let final_equity = broker.equity();
    let mut trades = broker.into_trades();
    annotate_signals(&mut trades, &signals);

    info!(
        bars = bars.len(),
        trades = trades.len(),
        signals = counters.signals(),
        final_equity,
        "backtest complete"
    );

    Ok(RunResult {
        equity_curve,
        trades,
        signals,
        conditions,
        counters,
        final_equity,
        bar_count: bars.len(),
        warmup_bars: detector.warmup_bars(),
    })
}

/// Stamp each trade with the detector value on its entry and exit bars.
pub fn annotate_signals(trades: &mut [TradeRecord], signals: &[Signal]) {
    let value_at = |i: usize| signals.get(i).copied().unwrap_or_default().value();
    for trade in trades {
        trade.entry_signal = value_at(trade.entry_bar);
        trade.exit_signal = value_at(trade.exit_bar);
    }
}
