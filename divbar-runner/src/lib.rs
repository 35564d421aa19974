//! Divbar Runner: backtest orchestration, metrics, export, batch mode, advisor.
//!
//! This crate builds on `divbar-core` to provide:
//! - TOML configuration with deterministic run ids
//! - CSV bar loading with lenient header handling, plus synthetic bars
//! - Single-backtest runner with metrics and condition diagnostics
//! - JSON / CSV / text artifact export
//! - Parallel batch mode over a directory of CSV files
//! - LLM rule-suggestion advisor

pub mod advisor;
pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use advisor::{
    build_prompt, extract_context, generate_suggestions, parse_suggestions, AdvisorError,
    LlmClient, OpenAiClient, StrategyContext, Suggestion,
};
pub use batch::{run_batch, write_batch_outputs, BatchError, BatchFailure, BatchReport};
pub use config::{AdvisorConfig, BacktestConfig, BacktestSection, ConfigError, RunId};
pub use data_loader::{load_csv, load_synthetic, parse_csv, LoadError, LoadedData};
pub use metrics::PerformanceMetrics;
pub use runner::{run_file, run_loaded, BacktestResult, RunnerError, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<AdvisorConfig>();
        assert_sync::<AdvisorConfig>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunnerError>();
        assert_sync::<RunnerError>();
        assert_send::<AdvisorError>();
        assert_sync::<AdvisorError>();
    }

    #[test]
    fn openai_client_is_send_sync() {
        assert_send::<OpenAiClient>();
        assert_sync::<OpenAiClient>();
    }
}
