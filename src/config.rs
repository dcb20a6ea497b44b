//! Engine configuration, loadable from TOML.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Top-level configuration for the exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Knobs for the trading engine itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cash balance credited to every newly provisioned trader.
    pub starting_balance: Decimal,
    /// Page size used when a caller does not specify one.
    pub default_page_size: usize,
    /// Maximum number of retained price-history points per market.
    /// Oldest points are dropped first once the cap is reached.
    pub price_history_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_balance: dec!(10000),
            default_page_size: 50,
            price_history_cap: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.starting_balance < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "engine.starting_balance",
                reason: format!("must be non-negative, got {}", self.engine.starting_balance),
            }
            .into());
        }
        if self.engine.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.default_page_size",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.engine.price_history_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.price_history_cap",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// Install a global tracing subscriber honoring the configured level.
///
/// `RUST_LOG` overrides the configured level when set. Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // A subscriber may already be installed (e.g. by a test harness).
    let _ = result;
}
