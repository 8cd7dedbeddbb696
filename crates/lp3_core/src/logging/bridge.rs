//! Routing of `log` crate records into the facility

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use super::facility::{enabled, write_message};
use super::format::display_lossy;
use super::level::LogLevel;

struct FacilityLogger;

static LOGGER: FacilityLogger = FacilityLogger;

impl Log for FacilityLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        enabled(LogLevel::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let level = LogLevel::from(record.level());
        if !enabled(level) {
            return;
        }
        let message = display_lossy(record.args());
        write_message(
            record.file().unwrap_or(record.target()),
            record.line().unwrap_or(0),
            level,
            &message,
        );
    }

    fn flush(&self) {}
}

/// Install the facility as the `log` crate's global logger
///
/// Filtering is left to the facility's threshold, so the `log` crate's own
/// maximum level is opened all the way.
pub(super) fn install() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
