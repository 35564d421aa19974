//! TOML backtest configuration.
//!
//! Every section and key is optional; missing values take the defaults of
//! the reference backtest (10k capital, 0.2% commission, near-full sizing).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use divbar_core::engine::EngineConfig;
use divbar_core::manager::ManagerConfig;

/// Deterministic identifier of a configuration (BLAKE3 hex digest).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: ManagerConfig,
    pub advisor: AdvisorConfig,
}

/// `[backtest]`: capital, costs and sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_capital: f64,
    /// Commission rate per fill, as a fraction of notional.
    pub commission: f64,
    pub position_size_pct: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            commission: 0.002,
            position_size_pct: 0.9999,
        }
    }
}

/// `[advisor]`: LLM call parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub model: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_retries: 3,
            timeout_secs: 30,
            temperature: 0.4,
            max_tokens: 800,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if !(bt.initial_capital.is_finite() && bt.initial_capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                bt.initial_capital
            )));
        }
        if !(bt.commission.is_finite() && bt.commission >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "commission must be non-negative, got {}",
                bt.commission
            )));
        }
        if !(bt.position_size_pct > 0.0 && bt.position_size_pct <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "position_size_pct must be in (0, 1], got {}",
                bt.position_size_pct
            )));
        }
        if self.strategy.structural_lookback == 0 {
            return Err(ConfigError::Invalid(
                "structural_lookback must be at least 1".into(),
            ));
        }
        if !self.strategy.structural_buffer.is_finite() {
            return Err(ConfigError::Invalid("structural_buffer must be finite".into()));
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_capital: self.backtest.initial_capital,
            commission_rate: self.backtest.commission,
            position_size_pct: self.backtest.position_size_pct,
            manager: self.strategy,
        }
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Identical configs share a RunId; any parameter change produces a new one.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divbar_core::manager::CancelThresholdMode;

    #[test]
    fn empty_document_gives_defaults() {
        let config = BacktestConfig::from_toml_str("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.backtest.initial_capital, 10_000.0);
        assert_eq!(config.backtest.commission, 0.002);
        assert_eq!(config.strategy.structural_lookback, 3);
        assert_eq!(config.advisor.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = BacktestConfig::from_toml_str(
            r#"
            [backtest]
            initial_capital = 50000.0

            [strategy]
            cancel_threshold = "same_extreme"
            structural_buffer = 0.25

            [advisor]
            max_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.backtest.initial_capital, 50_000.0);
        assert_eq!(config.backtest.commission, 0.002);
        assert_eq!(config.strategy.cancel_threshold, CancelThresholdMode::SameExtreme);
        assert_eq!(config.strategy.structural_buffer, 0.25);
        assert_eq!(config.strategy.structural_lookback, 3);
        assert_eq!(config.advisor.max_retries, 5);
        assert_eq!(config.advisor.timeout_secs, 30);
    }

    #[test]
    fn rejects_invalid_values() {
        for doc in [
            "[backtest]\ninitial_capital = 0.0",
            "[backtest]\ncommission = -0.01",
            "[backtest]\nposition_size_pct = 1.5",
            "[backtest]\nposition_size_pct = 0.0",
            "[strategy]\nstructural_lookback = 0",
        ] {
            assert!(
                matches!(BacktestConfig::from_toml_str(doc), Err(ConfigError::Invalid(_))),
                "accepted: {doc}"
            );
        }
    }

    #[test]
    fn rejects_unknown_cancel_mode() {
        let err = BacktestConfig::from_toml_str("[strategy]\ncancel_threshold = \"midpoint\"");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = BacktestConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        b.strategy.structural_lookback = 5;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);
    }

    #[test]
    fn engine_config_mapping() {
        let mut config = BacktestConfig::default();
        config.backtest.commission = 0.0;
        let engine = config.engine_config();
        assert_eq!(engine.commission_rate, 0.0);
        assert_eq!(engine.initial_capital, 10_000.0);
        assert_eq!(engine.manager, config.strategy);
    }
}
