//! # LP3 Core
//!
//! Support code shared by games built on top of SDL.
//!
//! ## Features
//!
//! - **Scoped Ownership**: `ResourceGuard` owns a foreign handle and calls its
//!   destroy function exactly once
//! - **Leveled Logging**: five severity macros with runtime filtering from
//!   `LP3_LOG_LEVEL` and compile-time elision behind the `log-disable` feature
//! - **External Console**: log lines and watched variables are forwarded to an
//!   interactive console when one is listening
//! - **Configuration**: logging behaviour loadable from TOML or RON files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lp3_core::prelude::*;
//!
//! fn main() {
//!     let _log = LogSystem::new();
//!     lp3_log_debug!("Greetings from the demo.");
//!
//!     for (index, arg) in std::env::args().enumerate() {
//!         lp3_log_info!("%d. %s", index, arg);
//!     }
//!
//!     lp3_log_debug!("Good bye.");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments
)]

pub mod config;
pub mod error;
pub mod logging;
pub mod resource;

pub use error::{GuardStateViolation, ResourceError};
pub use logging::{LogLevel, LogSystem};
pub use resource::{Deleter, ForeignHandle, ResourceGuard};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        error::{GuardStateViolation, ResourceError},
        logging::{LogConfig, LogLevel, LogSink, LogSystem, LogSystemBuilder, MemorySink},
        resource::{Deleter, ForeignHandle, ResourceGuard},
        define_resource, lp3_log, lp3_log_critical, lp3_log_debug, lp3_log_error, lp3_log_info,
        lp3_log_set, lp3_log_warning,
    };
}
