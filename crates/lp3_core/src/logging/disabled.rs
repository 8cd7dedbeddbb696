//! Logging compiled out by the `log-disable` feature
//!
//! Mirrors the facility's API so callers build unchanged. `enabled` is a
//! constant `false`, so the macros type-check their arguments but never
//! evaluate them, and no process-wide state exists.

use std::fmt::Display;
use std::marker::PhantomData;

use super::config::LogConfig;
use super::level::LogLevel;
use super::sink::LogSink;

/// Always `false`: logging is compiled out
#[inline(always)]
pub const fn enabled(_level: LogLevel) -> bool {
    false
}

/// Always `None`: logging is compiled out
pub const fn current_level() -> Option<LogLevel> {
    None
}

/// No-op
pub const fn set_level(_level: LogLevel) {}

/// No-op
#[inline(always)]
pub fn write_message(_file: &str, _line: u32, _level: LogLevel, _message: &str) {}

/// No-op
#[inline(always)]
pub fn write_formatted(
    _file: &str,
    _line: u32,
    _level: LogLevel,
    _format: &str,
    _args: &[&dyn Display],
) {
}

/// No-op
#[inline(always)]
pub fn write_variable(_file: &str, _line: u32, _name: &dyn Display, _value: &dyn Display) {}

/// Stand-in for the logging guard; does nothing
#[must_use = "logging stops as soon as the LogSystem is dropped"]
#[derive(Debug)]
pub struct LogSystem {
    _not_send: PhantomData<*const ()>,
}

impl LogSystem {
    /// Does nothing
    pub const fn new() -> Self {
        Self { _not_send: PhantomData }
    }

    /// Does nothing
    pub fn with_config(_config: LogConfig) -> Self {
        Self::new()
    }

    /// Builder whose options are ignored
    pub const fn builder() -> LogSystemBuilder {
        LogSystemBuilder
    }

    /// Always `false`: logging is compiled out
    pub const fn is_running() -> bool {
        false
    }
}

impl Default for LogSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder whose options are ignored
#[derive(Debug, Default)]
pub struct LogSystemBuilder;

impl LogSystemBuilder {
    /// Ignored
    #[must_use]
    pub fn config(self, _config: LogConfig) -> Self {
        self
    }

    /// Ignored
    #[must_use]
    pub const fn level(self, _level: LogLevel) -> Self {
        self
    }

    /// Ignored; the sink is dropped
    #[must_use]
    pub fn sink(self, _sink: impl LogSink + 'static) -> Self {
        self
    }

    /// Ignored
    #[must_use]
    pub const fn bridge_log_crate(self, _enabled: bool) -> Self {
        self
    }

    /// Returns the inert guard
    pub const fn build(self) -> LogSystem {
        LogSystem::new()
    }
}
