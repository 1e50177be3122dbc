//! Configuration management
//!
//! Settings for the HTTP transport, logging, and the cooldown/polling
//! defaults, loaded from TOML. Everything has a serde default so an empty
//! or missing file is a valid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Resend-cooldown and polling defaults
    #[serde(default)]
    pub timers: TimerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Maximum number of retries for retryable requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimerSettings {
    /// Resend cooldown in seconds
    #[serde(default = "default_resend_timeout")]
    pub resend_timeout: u64,

    /// Push polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            resend_timeout: default_resend_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_resend_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    5000
}

impl Settings {
    /// Load configuration from file, or use defaults if not found
    pub fn load() -> Result<Self> {
        let config_paths = vec![
            PathBuf::from("config.toml"),
            PathBuf::from("/etc/ulogin/config.toml"),
            dirs::home_dir()
                .map(|h| h.join(".config/ulogin/config.toml"))
                .unwrap_or_default(),
        ];

        // Try to find config file
        for path in &config_paths {
            if path.exists() {
                tracing::debug!("Loading config from: {}", path.display());
                let contents =
                    std::fs::read_to_string(path).context("Failed to read config file")?;

                let settings: Settings =
                    toml::from_str(&contents).context("Failed to parse config file")?;

                return Ok(settings);
            }
        }

        // No config file found, use defaults
        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.http.timeout, 10);
        assert_eq!(settings.http.max_retries, 3);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.timers.resend_timeout, 10);
        assert_eq!(settings.timers.poll_interval_ms, 5000);
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let settings: Settings = toml::from_str(
            r#"
            [http]
            timeout = 30

            [timers]
            resend_timeout = 60
            "#,
        )
        .unwrap();
        assert_eq!(settings.http.timeout, 30);
        assert_eq!(settings.http.connect_timeout, 5);
        assert_eq!(settings.timers.resend_timeout, 60);
    }
}
