//! Reporting and export: JSON, CSV, and fixed-width text artifacts.
//!
//! Provides three export formats for backtest results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade tape and equity curve for external analysis tools
//! - **Text**: the aligned trades table printed by the CLI
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use divbar_core::domain::{Direction, TradeRecord};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Trade tape columns, in output order.
pub const TRADE_COLUMNS: [&str; 12] = [
    "Size",
    "EntryBar",
    "ExitBar",
    "EntryPrice",
    "ExitPrice",
    "SL",
    "TP",
    "PnL",
    "Commission",
    "ReturnPct",
    "Entry_DivergentBar",
    "Exit_DivergentBar",
];

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Signed size: positive for longs, negative for shorts.
fn signed_size(t: &TradeRecord) -> f64 {
    match t.direction {
        Direction::Long => t.size,
        Direction::Short => -t.size,
    }
}

fn trade_row(t: &TradeRecord) -> [String; 12] {
    [
        format!("{}", signed_size(t)),
        t.entry_bar.to_string(),
        t.exit_bar.to_string(),
        format!("{:.6}", t.entry_price),
        format!("{:.6}", t.exit_price),
        format!("{:.6}", t.stop_loss),
        // No take-profit leg; kept for column compatibility.
        String::new(),
        format!("{:.2}", t.net_pnl),
        format!("{:.2}", t.commission),
        format!("{:.4}", t.return_pct * 100.0),
        t.entry_signal.to_string(),
        t.exit_signal.to_string(),
    ]
}

/// Export a trade list as CSV.
///
/// Columns follow `TRADE_COLUMNS`; `ReturnPct` is in percent.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS)?;
    for t in trades {
        wtr.write_record(trade_row(t))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export trades from several runs as one CSV with a leading `Symbol` column.
pub fn export_combined_trades_csv<'a, I>(runs: I) -> Result<String>
where
    I: IntoIterator<Item = (&'a str, &'a [TradeRecord])>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["Symbol"];
    header.extend(TRADE_COLUMNS);
    wtr.write_record(&header)?;
    for (symbol, trades) in runs {
        for t in trades {
            let row = trade_row(t);
            wtr.write_record(std::iter::once(symbol).chain(row.iter().map(String::as_str)))?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export an equity curve as CSV with bar_index and equity columns.
pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.2}", eq)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Text table ─────────────────────────────────────────────────────

/// Right-aligned fixed-width trades table.
pub fn format_trades_table(trades: &[TradeRecord]) -> String {
    let rows: Vec<[String; 12]> = trades.iter().map(trade_row).collect();
    let widths: Vec<usize> = TRADE_COLUMNS
        .iter()
        .enumerate()
        .map(|(col, name)| {
            rows.iter()
                .map(|r| r[col].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_aligned(&mut out, TRADE_COLUMNS.iter().copied(), &widths);
    for row in &rows {
        push_aligned(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_aligned<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join("  "));
}

/// One-block metrics summary for terminal output.
pub fn format_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let c = &result.counters;
    let mut out = String::new();
    let _ = writeln!(out, "Symbol:          {}", result.symbol);
    let _ = writeln!(
        out,
        "Period:          {} to {} ({} bars, {} warmup)",
        result.start_date, result.end_date, result.bar_count, result.warmup_bars
    );
    if result.has_synthetic {
        let _ = writeln!(out, "Data:            SYNTHETIC");
    }
    let _ = writeln!(out, "Trades:          {}", m.trade_count);
    let _ = writeln!(out, "Win rate:        {:.1}%", m.win_rate_pct);
    let _ = writeln!(out, "Expectancy:      {:.2}%", m.expectancy_pct);
    let _ = writeln!(out, "Total return:    {:.2}%", m.total_return * 100.0);
    let _ = writeln!(out, "Max drawdown:    {:.2}%", m.max_drawdown_pct);
    let _ = writeln!(out, "Sharpe:          {:.3}", m.sharpe);
    let _ = writeln!(out, "Profit factor:   {:.2}", m.profit_factor);
    let _ = writeln!(out, "Final equity:    {:.2}", m.final_equity);
    let _ = writeln!(
        out,
        "Signals:         {} ({} bullish, {} bearish)",
        c.signals(),
        c.bullish_signals,
        c.bearish_signals
    );
    let _ = writeln!(
        out,
        "Orders:          {} placed, {} stale, {} superseded, {} reversals, {} stop moves",
        c.manager.orders_placed,
        c.manager.cancelled_stale,
        c.manager.cancelled_superseded,
        c.manager.reversals,
        c.manager.stop_adjustments
    );
    out
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run into `output_dir`:
/// - `result.json`: the full `BacktestResult`
/// - `trades.csv`: trade tape
/// - `trades_output.txt`: aligned trades table
/// - `equity.csv`: bar-by-bar equity curve
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let json = export_json(result)?;
    write_file(&output_dir.join("result.json"), &json)?;
    write_file(&output_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write_file(
        &output_dir.join("trades_output.txt"),
        &format_trades_table(&result.trades),
    )?;
    write_file(
        &output_dir.join("equity.csv"),
        &export_equity_csv(&result.equity_curve)?,
    )?;
    Ok(())
}

/// Load a `BacktestResult` from an artifact directory's result.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use divbar_core::domain::ExitReason;

    fn trade(direction: Direction, net_pnl: f64) -> TradeRecord {
        let time = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TradeRecord {
            direction,
            size: 117.0,
            entry_bar: 40,
            entry_time: time,
            entry_price: 85.0,
            exit_bar: 41,
            exit_time: time,
            exit_price: 89.0,
            exit_reason: ExitReason::StopLoss,
            stop_loss: 89.0,
            gross_pnl: net_pnl + 40.72,
            commission: 40.72,
            net_pnl,
            return_pct: 0.0362,
            entry_signal: 1,
            exit_signal: 0,
        }
    }

    #[test]
    fn trades_csv_columns() {
        let csv = export_trades_csv(&[trade(Direction::Long, 427.28)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Size,EntryBar,ExitBar,EntryPrice,ExitPrice,SL,TP,PnL,Commission,ReturnPct,Entry_DivergentBar,Exit_DivergentBar"
        );
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[0], "117");
        assert_eq!(row[1], "40");
        assert_eq!(row[6], "");
        assert_eq!(row[7], "427.28");
        assert_eq!(row[9], "3.6200");
        assert_eq!(row[10], "1");
    }

    #[test]
    fn short_size_is_negative() {
        let csv = export_trades_csv(&[trade(Direction::Short, -10.0)]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("-117,"));
    }

    #[test]
    fn combined_csv_prefixes_symbol() {
        let a = [trade(Direction::Long, 1.0)];
        let b = [trade(Direction::Short, 2.0), trade(Direction::Long, 3.0)];
        let csv = export_combined_trades_csv([("AAA", &a[..]), ("BBB", &b[..])]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Symbol,Size,"));
        assert!(lines[1].starts_with("AAA,117,"));
        assert!(lines[3].starts_with("BBB,117,"));
    }

    #[test]
    fn equity_csv() {
        let csv = export_equity_csv(&[10_000.0, 10_050.5]).unwrap();
        assert_eq!(csv, "bar_index,equity\n0,10000.00\n1,10050.50\n");
    }

    #[test]
    fn table_is_aligned() {
        let table = format_trades_table(&[trade(Direction::Long, 427.28)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), lines[1].len());
        assert!(lines[0].trim_start().starts_with("Size"));
    }

    #[test]
    fn empty_table_has_header() {
        let table = format_trades_table(&[]);
        assert_eq!(table.lines().count(), 1);
    }
}
