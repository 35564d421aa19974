//! Batch mode: backtest every CSV file in a directory in parallel.
//!
//! Runs share nothing; a file that fails to load or run is recorded as a
//! failure and the remaining files still complete.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BacktestConfig;
use crate::export::{export_combined_trades_csv, save_artifacts};
use crate::runner::{run_file, BacktestResult};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read input dir '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no .csv files found in '{0}'")]
    NoInputs(PathBuf),
}

/// A file that could not be backtested.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<BacktestResult>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// `SYMBOL: Total Trades=N, Cumulative PnL=X` per successful file.
    pub fn summary_lines(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| {
                format!(
                    "{}: Total Trades={}, Cumulative PnL={:.2}",
                    r.symbol,
                    r.trades.len(),
                    r.cumulative_pnl()
                )
            })
            .collect()
    }
}

/// Sorted list of `*.csv` files (case-insensitive extension) directly in `dir`.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let io_err = |source| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Backtest every CSV in `input_dir` with the same configuration.
pub fn run_batch(input_dir: &Path, config: &BacktestConfig) -> Result<BatchReport, BatchError> {
    let files = discover_csv_files(input_dir)?;
    if files.is_empty() {
        return Err(BatchError::NoInputs(input_dir.to_path_buf()));
    }
    info!(files = files.len(), dir = %input_dir.display(), "starting batch");

    let outcomes: Vec<(PathBuf, Result<BacktestResult, String>)> = files
        .into_par_iter()
        .map(|path| {
            let outcome = run_file(&path, config).map_err(|e| e.to_string());
            (path, outcome)
        })
        .collect();

    let mut report = BatchReport::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(result) => report.results.push(result),
            Err(error) => {
                warn!(path = %path.display(), %error, "batch file failed");
                report.failures.push(BatchFailure { path, error });
            }
        }
    }
    info!(
        succeeded = report.results.len(),
        failed = report.failures.len(),
        "batch complete"
    );
    Ok(report)
}

/// Write `combined_results.csv` plus one artifact directory per symbol.
pub fn write_batch_outputs(report: &BatchReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let combined = export_combined_trades_csv(
        report
            .results
            .iter()
            .map(|r| (r.symbol.as_str(), r.trades.as_slice())),
    )?;
    let path = output_dir.join("combined_results.csv");
    std::fs::write(&path, combined)
        .with_context(|| format!("failed to write {}", path.display()))?;

    for result in &report.results {
        save_artifacts(result, &output_dir.join(&result.symbol))?;
    }
    Ok(())
}
