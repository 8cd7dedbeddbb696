//! Logging configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::level::LogLevel;
use crate::config::Config;

/// Environment variable naming the runtime threshold
pub const LEVEL_ENV_VAR: &str = "LP3_LOG_LEVEL";

/// Environment variable naming the external console address
pub const CONSOLE_ENV_VAR: &str = "LP3_CONSOLE_ADDR";

/// Settings read once when the facility starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Variable consulted for the threshold
    pub level_env_var: String,
    /// Threshold used when the variable is unset or unrecognized
    pub default_level: LogLevel,
    /// Variable consulted for the external console address
    pub console_env_var: String,
    /// Console address used when the variable is unset
    pub console_address: Option<String>,
    /// How long to wait for the console to accept, in milliseconds
    pub console_timeout_ms: u64,
}

impl LogConfig {
    /// Configuration with the stock variable names and compiled-in default
    pub fn new() -> Self {
        Self {
            level_env_var: LEVEL_ENV_VAR.to_string(),
            default_level: LogLevel::compiled_default(),
            console_env_var: CONSOLE_ENV_VAR.to_string(),
            console_address: None,
            console_timeout_ms: 50,
        }
    }

    /// Set the fallback threshold
    #[must_use]
    pub const fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Read the threshold from a different variable
    #[must_use]
    pub fn with_level_env_var(mut self, name: impl Into<String>) -> Self {
        self.level_env_var = name.into();
        self
    }

    /// Read the console address from a different variable
    #[must_use]
    pub fn with_console_env_var(mut self, name: impl Into<String>) -> Self {
        self.console_env_var = name.into();
        self
    }

    /// Probe this console address when the variable is unset
    #[must_use]
    pub fn with_console_address(mut self, address: impl Into<String>) -> Self {
        self.console_address = Some(address.into());
        self
    }

    /// Console connect timeout
    pub const fn console_timeout(&self) -> Duration {
        Duration::from_millis(self.console_timeout_ms)
    }

    /// Threshold named by the environment, or the default
    pub fn threshold_from_env(&self) -> LogLevel {
        let value = std::env::var(&self.level_env_var).ok();
        LogLevel::resolve(value.as_deref(), self.default_level)
    }

    /// Console address from the environment, or the configured one
    pub fn console_address_from_env(&self) -> Option<String> {
        std::env::var(&self.console_env_var)
            .ok()
            .filter(|address| !address.trim().is_empty())
            .or_else(|| self.console_address.clone())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for LogConfig {}
