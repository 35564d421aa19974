//! Backtest runner: wires together loading, engine, and metrics.
//!
//! Two entry points:
//! - `run_file()`: loads a CSV, then runs. Used by the CLI and batch mode.
//! - `run_loaded()`: takes pre-loaded bars. Used for synthetic data and tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use divbar_core::domain::TradeRecord;
use divbar_core::engine::{run_backtest, RunCounters, RunError};
use divbar_core::signal::{condition_diagnostics, ConditionDiagnostic};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_csv, LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest error: {0}")]
    Run(#[from] RunError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub symbol: String,
    pub start_date: String,
    pub end_date: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub bar_count: usize,
    pub warmup_bars: usize,
    /// CSV rows skipped at load time.
    pub dropped_rows: usize,
    pub initial_capital: f64,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub counters: RunCounters,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<f64>,
    /// Per-condition pass rates over the run.
    #[serde(default)]
    pub diagnostics: Vec<ConditionDiagnostic>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Symbol name for a data file: its stem (`data/SPY.csv` → `SPY`).
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Load `path` and run a backtest on it.
pub fn run_file(path: &Path, config: &BacktestConfig) -> Result<BacktestResult, RunnerError> {
    let loaded = load_csv(path)?;
    run_loaded(&symbol_from_path(path), &loaded, config)
}

/// Run a backtest on pre-loaded bars without I/O.
pub fn run_loaded(
    symbol: &str,
    loaded: &LoadedData,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunnerError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let engine_config = config.engine_config();

    let run = run_backtest(&loaded.bars, &engine_config)?;
    let metrics = PerformanceMetrics::compute(
        &run.equity_curve,
        &run.trades,
        engine_config.initial_capital,
    );
    let diagnostics = condition_diagnostics(&run.conditions);

    let start_date = loaded
        .bars
        .first()
        .map(|b| b.timestamp.date().to_string())
        .unwrap_or_default();
    let end_date = loaded
        .bars
        .last()
        .map(|b| b.timestamp.date().to_string())
        .unwrap_or_default();

    info!(
        symbol,
        trades = metrics.trade_count,
        total_return = metrics.total_return,
        sharpe = metrics.sharpe,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        symbol: symbol.to_string(),
        start_date,
        end_date,
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.synthetic,
        bar_count: run.bar_count,
        warmup_bars: run.warmup_bars,
        dropped_rows: loaded.dropped_rows,
        initial_capital: engine_config.initial_capital,
        config: config.clone(),
        metrics,
        counters: run.counters,
        trades: run.trades,
        equity_curve: run.equity_curve,
        diagnostics,
    })
}

impl BacktestResult {
    /// Sum of net P/L over all closed trades.
    pub fn cumulative_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.net_pnl).sum()
    }
}
