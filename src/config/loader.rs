//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.
//! Every section has defaults, so a missing section (or an empty file) runs
//! against the FENEGOSIDA board with the stock polling and pricing rules.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::source::{
    SourceFetcherConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_SOURCE_URL, DEFAULT_USER_AGENT,
};
use crate::application::poller::{PollerConfig, DEFAULT_RETRY_INTERVAL, DEFAULT_STEADY_INTERVAL};
use crate::domain::extractor::{ExtractorConfig, DEFAULT_TEN_GRAM_LABEL, DEFAULT_TOLA_LABEL};
use crate::domain::pricing::{DeductionRule, PricingPolicy, UnitFormat, DEFAULT_CURRENCY_PREFIX};
use crate::domain::quote::TOLA_PER_TEN_GRAM;
use crate::domain::snapshot_store::DEFAULT_STORE_FILE;

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub source: SourceSection,
    pub polling: PollingSection,
    pub store: StoreSection,
    pub pricing: PricingSection,
    pub logging: LoggingSection,
}

/// Read API listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address
    pub host: IpAddr,
    /// Listen port
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
        }
    }
}

impl ServerSection {
    /// Get port with environment variable override
    /// Checks PORT env var first, falls back to config value
    pub fn get_port(&self) -> u16 {
        parse_port(std::env::var("PORT").ok()).unwrap_or(self.port)
    }

    pub fn bind_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.host, port)
    }
}

fn parse_port(value: Option<String>) -> Option<u16> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Rate board source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Display name used in the provenance label ("Live: <name>")
    pub name: String,
    /// Page to scrape
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with each fetch
    pub user_agent: String,
    /// Label preceding the per-tola price
    pub tola_label: String,
    /// Label preceding the per-10-gram price
    pub ten_gram_label: String,
    /// Price per tola / price per 10 grams
    pub tola_per_ten_gram: f64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            name: "FENEGOSIDA".to_string(),
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tola_label: DEFAULT_TOLA_LABEL.to_string(),
            ten_gram_label: DEFAULT_TEN_GRAM_LABEL.to_string(),
            tola_per_ten_gram: TOLA_PER_TEN_GRAM,
        }
    }
}

impl SourceSection {
    /// Get source URL with environment variable override
    /// Checks SILVER_SOURCE_URL env var first, falls back to config value
    pub fn get_url(&self) -> String {
        std::env::var("SILVER_SOURCE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.url.clone())
    }
}

/// Polling cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSection {
    /// Interval between polls while healthy
    pub steady_interval_secs: u64,
    /// Interval between retries after a failed poll
    pub retry_interval_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            steady_interval_secs: DEFAULT_STEADY_INTERVAL.as_secs(),
            retry_interval_secs: DEFAULT_RETRY_INTERVAL.as_secs(),
        }
    }
}

/// Snapshot file location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Snapshot JSON file (supports ~)
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_FILE.to_string(),
        }
    }
}

impl StoreSection {
    /// Snapshot path with `~` expanded
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// Board pricing rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingSection {
    /// Prefix before every displayed amount
    pub currency_prefix: String,
    /// Tola prices are rounded to a multiple of this
    pub tola_step: Decimal,
    /// 10 gram prices are rounded to a multiple of this
    pub ten_gram_step: Decimal,
    /// Buy price deduction
    pub deduction: DeductionRule,
}

impl Default for PricingSection {
    fn default() -> Self {
        Self {
            currency_prefix: DEFAULT_CURRENCY_PREFIX.to_string(),
            tola_step: UnitFormat::tola().step,
            ten_gram_step: UnitFormat::ten_gram().step,
            deduction: DeductionRule::default(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }
    load_config(path)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate source section
        if !(self.source.url.starts_with("http://") || self.source.url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "source.url must be an http(s) URL, got '{}'",
                self.source.url
            )));
        }

        if self.source.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "source.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.source.tola_label.trim().is_empty() || self.source.ten_gram_label.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source labels cannot be empty".to_string(),
            ));
        }

        if !(self.source.tola_per_ten_gram.is_finite() && self.source.tola_per_ten_gram > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "tola_per_ten_gram must be > 0, got {}",
                self.source.tola_per_ten_gram
            )));
        }

        // Validate polling section
        if self.polling.steady_interval_secs == 0 || self.polling.retry_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "polling intervals must be > 0".to_string(),
            ));
        }

        // Validate store section
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.path cannot be empty".to_string(),
            ));
        }

        // Validate pricing section
        if self.pricing.tola_step <= Decimal::ZERO || self.pricing.ten_gram_step <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "pricing steps must be > 0".to_string(),
            ));
        }

        match &self.pricing.deduction {
            DeductionRule::Percentage { percent } => {
                if *percent < Decimal::ZERO || *percent >= Decimal::ONE_HUNDRED {
                    return Err(ConfigError::ValidationError(format!(
                        "deduction percent must be 0-100, got {}",
                        percent
                    )));
                }
            }
            DeductionRule::Flat { tola, ten_gram } => {
                if *tola < Decimal::ZERO || *ten_gram < Decimal::ZERO {
                    return Err(ConfigError::ValidationError(
                        "flat deduction amounts cannot be negative".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

// Conversions into component configs

impl From<&Config> for SourceFetcherConfig {
    fn from(config: &Config) -> Self {
        SourceFetcherConfig {
            url: config.source.get_url(),
            timeout: Duration::from_secs(config.source.timeout_secs),
            user_agent: config.source.user_agent.clone(),
        }
    }
}

impl From<&Config> for ExtractorConfig {
    fn from(config: &Config) -> Self {
        ExtractorConfig {
            tola_label: config.source.tola_label.clone(),
            ten_gram_label: config.source.ten_gram_label.clone(),
            tola_per_ten_gram: config.source.tola_per_ten_gram,
        }
    }
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        PollerConfig {
            steady_interval: Duration::from_secs(config.polling.steady_interval_secs),
            retry_interval: Duration::from_secs(config.polling.retry_interval_secs),
        }
    }
}

impl From<&Config> for PricingPolicy {
    fn from(config: &Config) -> Self {
        PricingPolicy {
            deduction: config.pricing.deduction.clone(),
            tola: UnitFormat {
                step: config.pricing.tola_step,
                ..UnitFormat::tola()
            },
            ten_gram: UnitFormat {
                step: config.pricing.ten_gram_step,
                ..UnitFormat::ten_gram()
            },
            currency_prefix: config.pricing.currency_prefix.clone(),
        }
    }
}
