//! Leveled logging
//!
//! A small logging facility with five severities. Create a [`LogSystem`] in
//! `main` and use the `lp3_log_*!` macros anywhere below it:
//!
//! ```rust,no_run
//! use lp3_core::{logging::LogSystem, lp3_log_debug, lp3_log_error};
//!
//! let _log = LogSystem::new();
//! lp3_log_debug!("Greetings from the demo.");
//! lp3_log_error!("%d. %s", 0, "first argument");
//! ```
//!
//! Which messages get through is decided by the `LP3_LOG_LEVEL` environment
//! variable (`critical`, `error`, `warning`, `info` or `debug`, any case),
//! read once when the facility starts. Unset or unknown values fall back to
//! `debug` in debug builds and `error` in release builds.
//!
//! Lines go to stdout. If an external console is listening at the address in
//! `LP3_CONSOLE_ADDR` when the facility starts, lines are forwarded there too.
//!
//! Building with the `log-disable` feature turns every macro into a no-op
//! whose arguments are never evaluated.

mod config;
pub mod external;
pub mod format;
mod level;
mod macros;
mod sink;

#[cfg(not(feature = "log-disable"))]
mod bridge;
#[cfg(feature = "log-disable")]
mod disabled;
#[cfg(not(feature = "log-disable"))]
mod facility;

pub use config::{LogConfig, CONSOLE_ENV_VAR, LEVEL_ENV_VAR};
pub use external::ExternalConsole;
pub use format::{format_message, FormatError};
pub use level::{LogLevel, ParseLevelError};
pub use sink::{CapturedRecord, ConsoleSink, LogRecord, LogSink, MemorySink};

#[cfg(feature = "log-disable")]
pub use disabled::{
    current_level, enabled, set_level, write_formatted, write_message, write_variable, LogSystem,
    LogSystemBuilder,
};
#[cfg(not(feature = "log-disable"))]
pub use facility::{
    current_level, enabled, set_level, write_formatted, write_message, write_variable, LogSystem,
    LogSystemBuilder,
};

/// Whether the facility was compiled in
pub const COMPILED_IN: bool = cfg!(not(feature = "log-disable"));
