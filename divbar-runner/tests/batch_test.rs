use std::path::Path;

use chrono::NaiveDate;
use divbar_runner::data_loader::generate_synthetic_bars;
use divbar_runner::{run_batch, run_file, write_batch_outputs, BacktestConfig, BatchError};

fn write_csv(path: &Path, symbol: &str) {
    let bars = generate_synthetic_bars(
        symbol,
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
    );
    let mut wtr = csv::Writer::from_path(path).unwrap();
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])
        .unwrap();
    for b in &bars {
        wtr.write_record([
            b.timestamp.date().to_string(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            b.volume.to_string(),
        ])
        .unwrap();
    }
    wtr.flush().unwrap();
}

#[test]
fn batch_runs_every_csv_and_collects_failures() {
    let input = tempfile::tempdir().unwrap();
    write_csv(&input.path().join("BBB.csv"), "BBB");
    write_csv(&input.path().join("AAA.csv"), "AAA");
    std::fs::write(input.path().join("BROKEN.csv"), "foo,bar\n1,2\n").unwrap();
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let report = run_batch(input.path(), &BacktestConfig::default()).unwrap();

    let symbols: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAA", "BBB"]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("BROKEN.csv"));

    let lines = report.summary_lines();
    assert!(lines[0].starts_with("AAA: Total Trades="));
    assert!(lines[0].contains("Cumulative PnL="));
}

#[test]
fn parallel_batch_matches_serial_runs() {
    let input = tempfile::tempdir().unwrap();
    for sym in ["X1", "X2", "X3", "X4"] {
        write_csv(&input.path().join(format!("{sym}.csv")), sym);
    }
    let config = BacktestConfig::default();

    let report = run_batch(input.path(), &config).unwrap();
    for result in &report.results {
        let serial = run_file(&input.path().join(format!("{}.csv", result.symbol)), &config).unwrap();
        assert_eq!(serial.trades, result.trades);
        assert_eq!(serial.equity_curve, result.equity_curve);
    }
}

#[test]
fn batch_outputs_include_combined_csv() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_csv(&input.path().join("AAA.csv"), "AAA");
    write_csv(&input.path().join("BBB.csv"), "BBB");

    let report = run_batch(input.path(), &BacktestConfig::default()).unwrap();
    write_batch_outputs(&report, output.path()).unwrap();

    let combined = std::fs::read_to_string(output.path().join("combined_results.csv")).unwrap();
    let total_trades: usize = report.results.iter().map(|r| r.trades.len()).sum();
    assert_eq!(combined.lines().count(), total_trades + 1);
    assert!(combined.starts_with("Symbol,Size,"));
    assert!(output.path().join("AAA").join("result.json").exists());
    assert!(output.path().join("BBB").join("trades.csv").exists());
}

#[test]
fn empty_directory_is_an_error() {
    let input = tempfile::tempdir().unwrap();
    let err = run_batch(input.path(), &BacktestConfig::default()).unwrap_err();
    assert!(matches!(err, BatchError::NoInputs(_)));
}
