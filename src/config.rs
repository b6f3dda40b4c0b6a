//! Configuration management for tradewatch
//!
//! This module defines the main `Config` struct, responsible for holding all
//! application settings. It uses the `figment` crate to load configuration
//! from a `tradewatch.toml` file and merge it with environment variables.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating the configuration. All of them
/// are fatal: the process reports them and exits before any connection
/// starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Minimum seconds between two consecutive user-visible notifications.
    pub notification_seconds: f64,
    /// Seconds between delivery loop wake-ups.
    pub iteration_wait_time_seconds: f64,
    /// Maximum silence on a feed connection before it is considered dead.
    pub keepalive_timeframe_seconds: f64,
    /// Fixed delay before re-establishing a dead connection.
    pub retry_timeframe_seconds: f64,
    /// Base URL of the streaming API.
    pub api_url: String,
    /// Base URL of the browser-facing search site.
    pub web_url: String,
    /// Subscription name -> search identifier. May be empty, in which case
    /// no connections are started.
    #[serde(default)]
    pub searches: BTreeMap<String, String>,
    /// Notifier settings.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Optional usage tracking; absent means tracking is disabled.
    #[serde(default)]
    pub analytics: Option<AnalyticsConfig>,
}

/// Notifier settings.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NotifyConfig {
    /// When set, alerts are POSTed to this webhook instead of the terminal.
    pub webhook_url: Option<String>,
}

/// Usage-tracking settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalyticsConfig {
    /// Endpoint that receives tracking events as JSON.
    pub endpoint: String,
}

impl Config {
    /// Loads the application configuration from the specified TOML file,
    /// layered with `TRADEWATCH_`-prefixed environment variables.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.is_file() {
            return Err(ConfigError::NotFound(config_path.to_path_buf()).into());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g.
            // TRADEWATCH_NOTIFICATION_SECONDS=10
            .merge(Env::prefixed("TRADEWATCH_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let timings = [
            ("notification_seconds", self.notification_seconds),
            (
                "iteration_wait_time_seconds",
                self.iteration_wait_time_seconds,
            ),
            (
                "keepalive_timeframe_seconds",
                self.keepalive_timeframe_seconds,
            ),
            ("retry_timeframe_seconds", self.retry_timeframe_seconds),
        ];
        for (name, value) in timings {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    /// Minimum gap between two dispatched notifications.
    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs_f64(self.notification_seconds)
    }

    /// Delivery loop wake-up cadence.
    pub fn iteration_wait(&self) -> Duration {
        Duration::from_secs_f64(self.iteration_wait_time_seconds)
    }

    /// Keepalive window for each feed connection.
    pub fn keepalive_timeframe(&self) -> Duration {
        Duration::from_secs_f64(self.keepalive_timeframe_seconds)
    }

    /// Reconnect delay for each feed connection.
    pub fn retry_timeframe(&self) -> Duration {
        Duration::from_secs_f64(self.retry_timeframe_seconds)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            notification_seconds: 4.0,
            iteration_wait_time_seconds: 1.0,
            keepalive_timeframe_seconds: 60.0,
            retry_timeframe_seconds: 30.0,
            api_url: "ws://live.poe.trade".to_string(),
            web_url: "http://poe.trade".to_string(),
            searches: BTreeMap::new(),
            notify: NotifyConfig::default(),
            analytics: None,
        }
    }
}
