use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const API_KEY_ENV: &str = "KALSHI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub trading: TradingConfig,
    pub logging: LoggingConfig,
    pub retry: RetryConfig,
    pub notifications: NotificationConfig,
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TradingConfig {
    pub bankroll: Decimal,
    pub risk_factor: Decimal,
    pub volatility_penalty: bool,
    pub min_data_points: usize,
    pub trade_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file_path: String,
    pub level: String,
}

/// Declared for a future retry loop; the client does not retry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Notify if profit/loss exceeds this fraction
    pub threshold: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub news_sentiment_threshold: f64,
    pub stat_arbitrage_threshold: f64,
    pub volatility_threshold: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Max fraction of bankroll committed to a single trade
    pub max_position_size_pct: Decimal,
    pub stop_loss_pct: Decimal,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.kalshi.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            bankroll: dec!(1000),
            risk_factor: dec!(1.0),
            volatility_penalty: true,
            min_data_points: 10,
            trade_interval_seconds: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_path: "trading_bot.log".to_string(),
            level: "INFO".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_seconds: 5,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: dec!(0.05),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            news_sentiment_threshold: 0.6,
            stat_arbitrage_threshold: 0.05,
            volatility_threshold: 0.1,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size_pct: dec!(0.10),
            stop_loss_pct: dec!(0.05),
        }
    }
}

impl ApiConfig {
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))?;

        if url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot be used as a base: {}", self.base_url);
        }

        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    /// Like [`AppConfig::load_from_path`], also reporting whether the file
    /// existed. Nothing is logged here so callers can report the source once
    /// their subscriber is installed.
    pub fn load_with_source<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource)> {
        let path = path.as_ref();
        let source = if path.exists() {
            ConfigSource::File(path.to_path_buf())
        } else {
            ConfigSource::Defaults(path.to_path_buf())
        };

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .build()
            .context("Failed to build configuration")?;

        let config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok((config, source))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The requested file was missing.
    Defaults(PathBuf),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
            ConfigSource::Defaults(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
        }
    }
}

/// Bearer token. Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: ApiKey,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} environment variable not set", API_KEY_ENV))?;

        if api_key.trim().is_empty() {
            anyhow::bail!("{} environment variable is empty", API_KEY_ENV);
        }

        Ok(Self::new(api_key))
    }
}
