//! Configuration settings for kolwatch.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Live feed connection settings.
    pub feed: FeedConfig,
    /// Tweet store settings.
    pub store: StoreConfig,
    /// Development simulator settings.
    pub simulator: SimulatorConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load_or_default() -> crate::Result<Self> {
        Self::load(None)
    }

    /// Load configuration from file, layered with `KOLWATCH__*` environment overrides.
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(path: Option<PathBuf>) -> crate::Result<Self> {
        let config_path = path.unwrap_or_else(super::default_config_path);

        ::config::Config::builder()
            .add_source(::config::File::from(config_path.as_path()).required(false))
            .add_source(::config::Environment::with_prefix(super::ENV_PREFIX).separator("__"))
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(|e| Error::config(e.to_string()))
            .and_then(|config| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Reject values the feed cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.feed.url.starts_with("ws://") || self.feed.url.starts_with("wss://")) {
            return Err(Error::invalid_input(format!(
                "feed.url must be a ws:// or wss:// URL, got {:?}",
                self.feed.url
            )));
        }
        if self.store.max_tweets == 0 {
            return Err(Error::invalid_input("store.max_tweets must be at least 1"));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> crate::Result<()> {
        let config_path = path.unwrap_or_else(super::default_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml()?)?;
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

/// Live feed connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Push-channel endpoint.
    pub url: String,
    /// Base delay before the first reconnect, doubled on every retry.
    pub base_reconnect_delay_ms: u64,
    /// Number of automatic retries before giving up.
    pub max_reconnect_attempts: u32,
    /// Timeout for a single connection attempt (0 disables it).
    pub connect_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "wss://monitor.cherrypump.com/tw".to_string(),
            base_reconnect_delay_ms: 1000,
            max_reconnect_attempts: 5,
            connect_timeout_secs: 10,
        }
    }
}

impl FeedConfig {
    /// Base reconnect delay as a duration.
    pub fn base_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.base_reconnect_delay_ms)
    }

    /// Connection attempt timeout, if any.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Tweet store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of tweets kept, newest first.
    pub max_tweets: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_tweets: 50 }
    }
}

/// Development simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Address the development server binds to.
    pub bind: String,
    /// Number of tweets sent right after subscription.
    pub initial_batch: usize,
    /// Delay before the initial batch, in milliseconds.
    pub initial_delay_ms: u64,
    /// Delay before the greeting status frame, in milliseconds.
    pub status_delay_ms: u64,
    /// Lower bound of the live tweet interval, in milliseconds.
    pub min_interval_ms: u64,
    /// Upper bound of the live tweet interval, in milliseconds.
    pub max_interval_ms: u64,
    /// Number of recent tweets eligible as reply/quote targets.
    pub recent_window: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            initial_batch: 5,
            initial_delay_ms: 1500,
            status_delay_ms: 1000,
            min_interval_ms: 3000,
            max_interval_ms: 8000,
            recent_window: 5,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub filter: String,
    /// Also write a daily rolling log file into the data directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "kolwatch=info".to_string(),
            file: false,
        }
    }
}
