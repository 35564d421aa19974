//! End-to-end tests: history in, trades and equity out.
//!
//! Tests:
//! 1. A bullish divergent bar fills, ratchets its stop, and stops out in profit
//! 2. Equity accounting matches the trade ledger
//! 3. An open position is closed at end of data
//! 4. The manager never rejects its own actions on a noisy random walk

use chrono::NaiveDate;
use divbar_core::domain::{Bar, Direction, ExitReason};
use divbar_core::engine::{run_backtest, EngineConfig};
use divbar_core::signal::Signal;

// ── Helpers ──────────────────────────────────────────────────────────

fn bar(day: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(day),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

/// 39 flat bars, a bullish divergent bar, a breakout, then `tail`.
fn bullish_history(tail: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..39).map(|i| bar(i, 100.0, 101.0, 99.0, 100.0)).collect();
    bars.push(bar(39, 81.0, 85.0, 80.0, 84.0));
    bars.push(bar(40, 84.0, 90.0, 83.0, 89.0));
    for (k, &(o, h, l, c)) in tail.iter().enumerate() {
        bars.push(bar(41 + k as i64, o, h, l, c));
    }
    bars
}

/// Deterministic noisy walk with wide ranges so signals fire.
fn make_noisy_bars(n: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0; // -1.0 to +1.0
        let swing = 1.0 + ((seed >> 17) % 400) as f64 / 100.0; // 1.0 to 5.0
        price = (price + change * 3.0).max(20.0);
        let open = price + change;
        let close = price - change;
        let high = open.max(close) + swing;
        let low = open.min(close) - swing;
        bars.push(bar(i as i64, open, high, low, close));
    }
    bars
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn bullish_breakout_ratchets_and_stops_out() {
    let bars = bullish_history(&[(89.0, 92.0, 88.0, 91.0), (100.0, 101.0, 99.0, 100.0)]);
    let result = run_backtest(&bars, &EngineConfig::default()).unwrap();

    assert_eq!(result.signals[39], Signal::Bullish);
    assert_eq!(result.counters.bullish_signals, 1);
    assert_eq!(result.counters.manager.orders_placed, 1);
    assert_eq!(result.counters.manager.stop_adjustments, 1);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.direction, Direction::Long);
    assert_eq!(trade.entry_bar, 40);
    assert_eq!(trade.entry_price, 85.0);
    assert_eq!(trade.size, 117.0);
    // Structural stop ratcheted to the flat-range low, then gapped through.
    assert_eq!(trade.stop_loss, 99.0);
    assert_eq!(trade.exit_bar, 41);
    assert_eq!(trade.exit_price, 89.0);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert_eq!(trade.entry_signal, 0);
    assert!(trade.is_winner());
}

#[test]
fn equity_matches_trade_ledger() {
    let bars = bullish_history(&[(89.0, 92.0, 88.0, 91.0), (100.0, 101.0, 99.0, 100.0)]);
    let config = EngineConfig::default();
    let result = run_backtest(&bars, &config).unwrap();

    let net: f64 = result.trades.iter().map(|t| t.net_pnl).sum();
    assert!((result.final_equity - (config.initial_capital + net)).abs() < 1e-6);
    assert_eq!(result.equity_curve.len(), bars.len());
    assert_eq!(*result.equity_curve.last().unwrap(), result.final_equity);

    let trade = &result.trades[0];
    let expected_commission = 0.002 * (85.0 + 89.0) * 117.0;
    assert!((trade.commission - expected_commission).abs() < 1e-9);
    assert!((trade.gross_pnl - 117.0 * 4.0).abs() < 1e-9);
}

#[test]
fn open_position_closed_at_end_of_data() {
    let bars = bullish_history(&[]);
    let result = run_backtest(&bars, &EngineConfig::default()).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    assert_eq!(trade.exit_bar, 40);
    assert_eq!(trade.exit_price, 89.0);
}

#[test]
fn noisy_walk_runs_cleanly() {
    let bars = make_noisy_bars(600);
    let result = run_backtest(&bars, &EngineConfig::default()).unwrap();

    assert!(result.signals[..34].iter().all(|s| *s == Signal::None));
    assert!(result.equity_curve.iter().all(|e| e.is_finite()));
    for pair in result.trades.windows(2) {
        assert!(pair[0].exit_bar <= pair[1].entry_bar, "overlapping trades");
    }
    for trade in &result.trades {
        assert!(trade.entry_bar > 34);
        assert!(trade.exit_bar >= trade.entry_bar);
    }
}
