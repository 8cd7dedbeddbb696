//! Log severity levels and threshold resolution

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Criticality of a log message
///
/// Lower rank means more severe. A threshold of `Info` lets through
/// `Critical`, `Error`, `Warning` and `Info` but drops `Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    /// Something went wrong and the program will probably terminate
    Critical = 0,
    /// An error occurred
    Error = 1,
    /// Something bad happened but no invariant was violated
    Warning = 2,
    /// Non-important information, possibly in a loop
    Info = 3,
    /// Debug output, possibly every frame
    Debug = 4,
}

impl LogLevel {
    /// Every level from most to least severe
    pub const ALL: [Self; 5] =
        [Self::Critical, Self::Error, Self::Warning, Self::Info, Self::Debug];

    /// Severity rank, 0 being the most severe
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Level with the given rank
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Critical),
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Info),
            4 => Some(Self::Debug),
            _ => None,
        }
    }

    /// Whether a message at `level` passes when `self` is the threshold
    pub const fn allows(self, level: Self) -> bool {
        level.rank() <= self.rank()
    }

    /// Lowercase name, as accepted by `LP3_LOG_LEVEL`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Uppercase tag used when rendering a line
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Threshold used when the environment does not name one
    ///
    /// `Debug` in debug builds, `Error` in release builds.
    pub const fn compiled_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Error
        }
    }

    /// Pick the threshold from an environment value
    ///
    /// The value is trimmed and compared case-insensitively with the level
    /// names. Anything else falls back to `default`.
    pub fn resolve(value: Option<&str>, default: Self) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or(default)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Unrecognized level name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}
