//! Divbar CLI: single runs, batch mode, and LLM rule suggestions.
//!
//! Commands:
//! - `run`: backtest one CSV file (or synthetic bars) and write artifacts
//! - `batch`: backtest every CSV in a directory in parallel
//! - `advise`: build the review prompt for a run and optionally query the model

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use divbar_runner::advisor::{
    build_prompt, extract_context, generate_suggestions, OpenAiClient, Suggestion,
};
use divbar_runner::export::{format_summary, format_trades_table, save_artifacts};
use divbar_runner::{
    load_csv, load_synthetic, run_batch, run_loaded, write_batch_outputs, AdvisorError,
    BacktestConfig, BacktestResult, LoadedData,
};

#[derive(Parser)]
#[command(
    name = "divbar",
    about = "Divbar CLI: divergent-bar stop-entry backtester"
)]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one CSV file and save result.json, trades.csv and trades_output.txt.
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        overrides: ConfigArgs,

        /// Output directory for artifacts.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Backtest every CSV file in a directory.
    Batch {
        /// Directory of CSV files.
        #[arg(long)]
        input_dir: PathBuf,

        /// Output directory for combined_results.csv and per-symbol artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        #[command(flatten)]
        overrides: ConfigArgs,
    },
    /// Print the rule-review prompt for a run and optionally ask the model.
    Advise {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        overrides: ConfigArgs,

        /// Chat model name (overrides [advisor].model).
        #[arg(long)]
        model: Option<String>,

        /// Only print the prompt; do not call the model.
        #[arg(long, default_value_t = false)]
        no_llm: bool,

        /// Write parsed suggestions to this JSON file.
        #[arg(long)]
        suggestions_json: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// OHLCV CSV file.
    csv: Option<PathBuf>,

    /// Use deterministic synthetic bars for this symbol instead of a CSV.
    #[arg(long, value_name = "SYMBOL", conflicts_with = "csv")]
    synthetic: Option<String>,

    /// Synthetic start date (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-02")]
    start: String,

    /// Synthetic end date (YYYY-MM-DD).
    #[arg(long, default_value = "2024-12-31")]
    end: String,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial capital (overrides [backtest].initial_capital).
    #[arg(long)]
    cash: Option<f64>,

    /// Commission rate per fill (overrides [backtest].commission).
    #[arg(long)]
    commission: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    match cli.command {
        Commands::Run {
            input,
            overrides,
            output_dir,
        } => run_cmd(&input, &overrides, &output_dir),
        Commands::Batch {
            input_dir,
            output_dir,
            overrides,
        } => batch_cmd(&input_dir, &output_dir, &overrides),
        Commands::Advise {
            input,
            overrides,
            model,
            no_llm,
            suggestions_json,
        } => advise_cmd(
            &input,
            &overrides,
            model,
            no_llm,
            suggestions_json.as_deref(),
        ),
    }
}

impl ConfigArgs {
    /// File config (or defaults) with flag overrides applied, then validated.
    fn resolve(&self) -> Result<BacktestConfig> {
        let mut config = BacktestConfig::load_or_default(self.config.as_deref())?;
        if let Some(cash) = self.cash {
            config.backtest.initial_capital = cash;
        }
        if let Some(commission) = self.commission {
            config.backtest.commission = commission;
        }
        config.validate()?;
        Ok(config)
    }
}

impl InputArgs {
    /// Symbol name and bars from the CSV path or the synthetic generator.
    fn load(&self) -> Result<(String, LoadedData)> {
        match (&self.csv, &self.synthetic) {
            (Some(path), None) => {
                let loaded =
                    load_csv(path).with_context(|| format!("failed to load {}", path.display()))?;
                Ok((divbar_runner::runner::symbol_from_path(path), loaded))
            }
            (None, Some(symbol)) => {
                let start = parse_date(&self.start)?;
                let end = parse_date(&self.end)?;
                warn!(symbol = %symbol, "using SYNTHETIC bars");
                Ok((symbol.clone(), load_synthetic(symbol, start, end)?))
            }
            _ => bail!("provide a CSV path or --synthetic SYMBOL"),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn backtest(input: &InputArgs, overrides: &ConfigArgs) -> Result<(BacktestConfig, BacktestResult)> {
    let config = overrides.resolve()?;
    let (symbol, loaded) = input.load()?;
    if loaded.dropped_rows > 0 {
        println!("Dropped {} unparseable rows", loaded.dropped_rows);
    }
    let result = run_loaded(&symbol, &loaded, &config)?;
    Ok((config, result))
}

fn run_cmd(input: &InputArgs, overrides: &ConfigArgs, output_dir: &Path) -> Result<()> {
    let (_, result) = backtest(input, overrides)?;

    println!();
    println!("=== Backtest Result ===");
    print!("{}", format_summary(&result));
    println!();
    println!("--- Trades ---");
    print!("{}", format_trades_table(&result.trades));

    save_artifacts(&result, output_dir)?;
    println!();
    println!("Artifacts saved to: {}", output_dir.display());
    Ok(())
}

fn batch_cmd(input_dir: &Path, output_dir: &Path, overrides: &ConfigArgs) -> Result<()> {
    let config = overrides.resolve()?;
    let report = run_batch(input_dir, &config)?;

    for line in report.summary_lines() {
        println!("{line}");
    }
    for failure in &report.failures {
        eprintln!("Error for {}: {}", failure.path.display(), failure.error);
    }

    write_batch_outputs(&report, output_dir)?;
    println!(
        "Combined results saved to: {}",
        output_dir.join("combined_results.csv").display()
    );
    Ok(())
}

fn advise_cmd(
    input: &InputArgs,
    overrides: &ConfigArgs,
    model: Option<String>,
    no_llm: bool,
    suggestions_json: Option<&Path>,
) -> Result<()> {
    let (mut config, result) = backtest(input, overrides)?;
    if let Some(model) = model {
        config.advisor.model = model;
    }

    let context = extract_context(&result.metrics, &result.trades);
    let prompt = build_prompt(&context, Some(&result.diagnostics))?;
    println!("=== LLM Prompt ===");
    println!("{prompt}");

    if no_llm {
        return Ok(());
    }

    let client = match OpenAiClient::from_env(config.advisor.clone()) {
        Ok(client) => client,
        Err(AdvisorError::MissingApiKey(var)) => {
            warn!("{var} not set; skipping model call");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let suggestions = generate_suggestions(&client, &context, Some(&result.diagnostics))?;
    print_suggestions(&suggestions);

    if let Some(path) = suggestions_json {
        let json = serde_json::to_string_pretty(&suggestions)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Suggestions saved to: {}", path.display());
    }
    Ok(())
}

fn print_suggestions(suggestions: &[Suggestion]) {
    println!();
    println!("=== Suggestions ===");
    if suggestions.is_empty() {
        println!("(no parseable suggestions)");
        return;
    }
    for (i, s) in suggestions.iter().enumerate() {
        println!("{}. {}", i + 1, s.change);
        if !s.rationale.is_empty() {
            println!("   Rationale: {}", s.rationale);
        }
        if !s.implementation_hint.is_empty() {
            println!("   Hint:      {}", s.implementation_hint);
        }
    }
}
