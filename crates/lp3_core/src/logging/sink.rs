//! Destinations for delivered log lines

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use super::external::ExternalConsole;
use super::level::LogLevel;

/// One delivered log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    /// Severity of the message
    pub level: LogLevel,
    /// Source file of the call site
    pub file: &'a str,
    /// Source line of the call site
    pub line: u32,
    /// Fully formatted message
    pub message: &'a str,
}

/// Where the facility writes delivered lines
///
/// Sinks must not fail loudly: write errors are swallowed.
///
/// Sink methods run while the facility is locked. They may call
/// [`set_level`](crate::logging::set_level) and
/// [`LogSystem::is_running`](crate::logging::LogSystem::is_running), and log
/// calls they make are dropped, but they must not build or drop a
/// [`LogSystem`](crate::logging::LogSystem).
pub trait LogSink: Send {
    /// Write one line that passed the threshold
    fn write_record(&mut self, record: &LogRecord<'_>);

    /// Publish a watched `name=value` pair
    ///
    /// The matching Debug line has already been written through
    /// [`write_record`](Self::write_record); only sinks with a variable-watch
    /// feature need to do anything here.
    fn set_variable(&mut self, _name: &str, _value: &str) {}

    /// Flush buffered output. Called when the facility shuts down.
    fn flush(&mut self) {}
}

/// Writes lines to a stream, normally stdout, and forwards them to an
/// external console when one was found
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
    external: Option<ExternalConsole>,
}

impl ConsoleSink {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Sink writing to any stream
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self { writer: Box::new(writer), external: None }
    }

    /// Also forward every line to `console`
    #[must_use]
    pub fn with_external(mut self, console: ExternalConsole) -> Self {
        self.external = Some(console);
        self
    }

    /// Whether lines are forwarded to an external console
    pub const fn has_external_console(&self) -> bool {
        self.external.is_some()
    }
}

impl LogSink for ConsoleSink {
    fn write_record(&mut self, record: &LogRecord<'_>) {
        let _ = writeln!(
            self.writer,
            "{}:{} [{}] {}",
            record.file,
            record.line,
            record.level.tag(),
            record.message
        );
        if let Some(console) = self.external.as_mut() {
            console.send_record(record);
        }
    }

    fn set_variable(&mut self, name: &str, value: &str) {
        if let Some(console) = self.external.as_mut() {
            console.send_variable(name, value);
        }
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
        if let Some(console) = self.external.as_mut() {
            console.flush();
        }
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink").field("external", &self.external).finish_non_exhaustive()
    }
}

/// Owned copy of a delivered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Severity of the message
    pub level: LogLevel,
    /// Source file of the call site
    pub file: String,
    /// Source line of the call site
    pub line: u32,
    /// Fully formatted message
    pub message: String,
}

#[derive(Debug, Default)]
struct Captured {
    records: Vec<CapturedRecord>,
    variables: Vec<(String, String)>,
}

/// Sink keeping every line in memory
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the facility.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    captured: Arc<Mutex<Captured>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written so far
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.with_captured(|captured| captured.records.clone())
    }

    /// Messages of every line written so far
    pub fn messages(&self) -> Vec<String> {
        self.with_captured(|captured| captured.records.iter().map(|r| r.message.clone()).collect())
    }

    /// Every variable published so far, oldest first
    pub fn variables(&self) -> Vec<(String, String)> {
        self.with_captured(|captured| captured.variables.clone())
    }

    /// Forget everything captured so far
    pub fn clear(&self) {
        self.with_captured(|captured| {
            captured.records.clear();
            captured.variables.clear();
        });
    }

    fn with_captured<R>(&self, f: impl FnOnce(&mut Captured) -> R) -> R {
        let mut captured = self.captured.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut captured)
    }
}

impl LogSink for MemorySink {
    fn write_record(&mut self, record: &LogRecord<'_>) {
        let owned = CapturedRecord {
            level: record.level,
            file: record.file.to_string(),
            line: record.line,
            message: record.message.to_string(),
        };
        self.with_captured(|captured| captured.records.push(owned));
    }

    fn set_variable(&mut self, name: &str, value: &str) {
        let pair = (name.to_string(), value.to_string());
        self.with_captured(|captured| captured.variables.push(pair));
    }
}
