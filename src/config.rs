//! Configuration module for studyhall.

use serde::Deserialize;
use std::path::Path;

use crate::{Error, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/studyhall.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session tokens. Change it in production;
    /// rotating it invalidates every outstanding token.
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    /// Whether self-service registration is open.
    #[serde(default = "default_registration_enabled")]
    pub registration_enabled: bool,
    /// Failed logins per username before lockout.
    #[serde(default = "default_max_login_failures")]
    pub max_login_failures: u32,
    /// Lockout window in seconds.
    #[serde(default = "default_lockout_window")]
    pub lockout_window_secs: u64,
}

fn default_token_secret() -> String {
    "change-me".to_string()
}

fn default_registration_enabled() -> bool {
    true
}

fn default_max_login_failures() -> u32 {
    5
}

fn default_lockout_window() -> u64 {
    5 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            registration_enabled: default_registration_enabled(),
            max_login_failures: default_max_login_failures(),
            lockout_window_secs: default_lockout_window(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "data/logs/studyhall.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}
