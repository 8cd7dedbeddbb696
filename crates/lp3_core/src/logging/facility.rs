//! Process-wide facility state and the `LogSystem` guard
//!
//! The threshold lives in an atomic so the level check done by every macro
//! costs one load. The sink lives behind a mutex and is only touched for
//! lines that pass the threshold. Both are written when the first
//! `LogSystem` is built and cleared when the last one is dropped.

use std::cell::Cell;
use std::fmt::Display;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::bridge;
use super::config::LogConfig;
use super::external::ExternalConsole;
use super::format::{display_lossy, format_or_degrade};
use super::level::LogLevel;
use super::sink::{ConsoleSink, LogRecord, LogSink};

/// Threshold rank plus one; zero while no facility is running.
static THRESHOLD: AtomicU8 = AtomicU8::new(OFF);
const OFF: u8 = 0;

static FACILITY: Mutex<Option<Facility>> = Mutex::new(None);
static BRIDGED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

struct Facility {
    sink: Box<dyn LogSink>,
    guards: usize,
}

fn facility() -> MutexGuard<'static, Option<Facility>> {
    FACILITY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether a message at `level` would currently be delivered
#[inline]
pub fn enabled(level: LogLevel) -> bool {
    level.rank() < THRESHOLD.load(Ordering::Relaxed)
}

/// The active threshold, or `None` outside a `LogSystem`'s lifetime
pub fn current_level() -> Option<LogLevel> {
    THRESHOLD.load(Ordering::Relaxed).checked_sub(1).and_then(LogLevel::from_rank)
}

/// Change the threshold of the running facility
///
/// Takes effect for the next log call. Ignored when no facility is running.
/// Safe to call from inside a [`LogSink`].
pub fn set_level(level: LogLevel) {
    let _ = THRESHOLD.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        (current != OFF).then_some(level.rank() + 1)
    });
}

/// Deliver an already formatted message
pub fn write_message(file: &str, line: u32, level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    dispatch(|sink| sink.write_record(&LogRecord { level, file, line, message }));
}

/// Format `args` into `format` and deliver the result
///
/// A malformed format string still produces a line: the raw format followed
/// by a `[format error: ..]` marker.
pub fn write_formatted(
    file: &str,
    line: u32,
    level: LogLevel,
    format: &str,
    args: &[&dyn Display],
) {
    if !enabled(level) {
        return;
    }
    let message = format_or_degrade(format, args);
    write_message(file, line, level, &message);
}

/// Deliver a Debug line `name=value` and publish the pair as a watched variable
pub fn write_variable(file: &str, line: u32, name: &dyn Display, value: &dyn Display) {
    if !enabled(LogLevel::Debug) {
        return;
    }
    let name = display_lossy(name);
    let value = display_lossy(value);
    let message = format!("{name}={value}");
    dispatch(|sink| {
        sink.write_record(&LogRecord { level: LogLevel::Debug, file, line, message: &message });
        sink.set_variable(&name, &value);
    });
}

/// Run `f` against the sink. Calls made from inside a sink are dropped.
fn dispatch(f: impl FnOnce(&mut dyn LogSink)) {
    struct Reentry;

    impl Drop for Reentry {
        fn drop(&mut self) {
            DISPATCHING.with(|flag| flag.set(false));
        }
    }

    if DISPATCHING.with(|flag| flag.replace(true)) {
        return;
    }
    let _reentry = Reentry;

    let mut slot = facility();
    if let Some(state) = slot.as_mut() {
        f(state.sink.as_mut());
    }
}

/// Scope guard owning the logging facility
///
/// Create one near the top of `main`. Logging calls made while no
/// `LogSystem` is alive are dropped.
///
/// Guards nest: while one is alive, building another keeps the existing
/// threshold and sink, and the facility shuts down when the last guard is
/// dropped.
///
/// A [`LogSink`] must not build or drop a `LogSystem` from inside its own
/// methods: the facility is locked while a sink runs.
#[must_use = "logging stops as soon as the LogSystem is dropped"]
#[derive(Debug)]
pub struct LogSystem {
    _not_send: PhantomData<*const ()>,
}

impl LogSystem {
    /// Start logging with the default configuration
    ///
    /// Reads `LP3_LOG_LEVEL` and probes for an external console.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start logging with `config`
    pub fn with_config(config: LogConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Customize how logging starts
    pub fn builder() -> LogSystemBuilder {
        LogSystemBuilder::default()
    }

    /// Whether a facility is currently running
    ///
    /// Safe to call from inside a [`LogSink`].
    pub fn is_running() -> bool {
        THRESHOLD.load(Ordering::Relaxed) != OFF
    }
}

impl Default for LogSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogSystem {
    fn drop(&mut self) {
        let mut slot = facility();
        let last = match slot.as_mut() {
            Some(state) => {
                state.guards -= 1;
                state.guards == 0
            }
            None => false,
        };
        if last {
            THRESHOLD.store(OFF, Ordering::Relaxed);
            if let Some(mut state) = slot.take() {
                state.sink.flush();
            }
        }
    }
}

/// Options for starting the facility
#[derive(Default)]
pub struct LogSystemBuilder {
    config: LogConfig,
    level: Option<LogLevel>,
    sink: Option<Box<dyn LogSink>>,
    bridge_log_crate: bool,
}

impl LogSystemBuilder {
    /// Use `config` for variable names, defaults and the console address
    #[must_use]
    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this threshold instead of reading the environment
    #[must_use]
    pub const fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Write to `sink` instead of the console
    #[must_use]
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Route records from the `log` crate macros into this facility
    #[must_use]
    pub const fn bridge_log_crate(mut self, enabled: bool) -> Self {
        self.bridge_log_crate = enabled;
        self
    }

    /// Start the facility, or join the one already running
    pub fn build(self) -> LogSystem {
        let mut slot = facility();
        let joined = match slot.as_mut() {
            Some(state) => {
                state.guards += 1;
                true
            }
            None => false,
        };

        let console = if joined {
            drop(slot);
            write_message(
                file!(),
                line!(),
                LogLevel::Debug,
                "LogSystem already running; keeping its configuration",
            );
            None
        } else {
            let threshold = self.level.unwrap_or_else(|| self.config.threshold_from_env());
            let (sink, console) = match self.sink {
                Some(sink) => (sink, None),
                None => select_sink(&self.config),
            };
            *slot = Some(Facility { sink, guards: 1 });
            THRESHOLD.store(threshold.rank() + 1, Ordering::Relaxed);
            drop(slot);
            console
        };

        if let Some(peer) = console {
            write_formatted(
                file!(),
                line!(),
                LogLevel::Debug,
                "Forwarding log output to console at %s",
                &[&peer],
            );
        }

        if self.bridge_log_crate && !BRIDGED.swap(true, Ordering::Relaxed) {
            if let Err(err) = bridge::install() {
                write_formatted(
                    file!(),
                    line!(),
                    LogLevel::Warning,
                    "Not routing `log` records: %s",
                    &[&err],
                );
            }
        }

        LogSystem { _not_send: PhantomData }
    }
}

fn select_sink(config: &LogConfig) -> (Box<dyn LogSink>, Option<SocketAddr>) {
    let sink = ConsoleSink::stdout();
    let console = config
        .console_address_from_env()
        .and_then(|address| ExternalConsole::probe(&address, config.console_timeout()));

    match console {
        Some(console) => {
            let peer = console.peer();
            (Box::new(sink.with_external(console)), Some(peer))
        }
        None => (Box::new(sink), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{CapturedRecord, MemorySink};
    use crate::test_support::serial;
    use crate::{
        lp3_log_critical, lp3_log_debug, lp3_log_error, lp3_log_info, lp3_log_set, lp3_log_warning,
    };
    use std::fmt;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::sync::Arc;

    struct Failing;

    impl Display for Failing {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    /// Sink that queries the facility while it is being written to
    struct Inspecting {
        running: Arc<Mutex<Vec<bool>>>,
    }

    impl LogSink for Inspecting {
        fn write_record(&mut self, record: &LogRecord<'_>) {
            let running = LogSystem::is_running();
            set_level(LogLevel::Error);
            lp3_log_error!("echo of %s", record.message);
            self.running.lock().unwrap().push(running);
        }
    }

    fn capture(level: LogLevel) -> (LogSystem, MemorySink) {
        let sink = MemorySink::new();
        let system = LogSystem::builder().level(level).sink(sink.clone()).build();
        (system, sink)
    }

    fn levels(records: &[CapturedRecord]) -> Vec<LogLevel> {
        records.iter().map(|r| r.level).collect()
    }

    #[test]
    fn test_environment_selects_threshold() {
        let _lock = serial();
        let config = LogConfig::new().with_default_level(LogLevel::Error);

        std::env::set_var("LP3_LOG_LEVEL", "info");
        let system = LogSystem::builder().config(config.clone()).sink(MemorySink::new()).build();
        assert_eq!(current_level(), Some(LogLevel::Info));
        drop(system);

        std::env::set_var("LP3_LOG_LEVEL", "bogus");
        let system = LogSystem::builder().config(config).sink(MemorySink::new()).build();
        assert_eq!(current_level(), Some(LogLevel::Error));
        drop(system);

        std::env::remove_var("LP3_LOG_LEVEL");
    }

    #[test]
    fn test_threshold_filters_by_rank() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Warning);

        lp3_log_critical!("critical");
        lp3_log_error!("error");
        lp3_log_warning!("warning");
        lp3_log_info!("info");
        lp3_log_debug!("debug");

        assert_eq!(
            levels(&sink.records()),
            vec![LogLevel::Critical, LogLevel::Error, LogLevel::Warning]
        );
    }

    #[test]
    fn test_debug_line_renders_arguments() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Debug);

        lp3_log_debug!("iteration = %d", 7);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "iteration = 7");
        assert_eq!(records[0].level, LogLevel::Debug);
        assert!(records[0].file.ends_with("facility.rs"));
        assert!(records[0].line > 0);
    }

    #[test]
    fn test_filtered_calls_do_not_evaluate_arguments() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Error);
        let evaluated = Cell::new(0);
        let expensive = || {
            evaluated.set(evaluated.get() + 1);
            "value"
        };

        lp3_log_debug!("skipped %s", expensive());
        assert_eq!(evaluated.get(), 0);

        lp3_log_error!("kept %s", expensive());
        assert_eq!(evaluated.get(), 1);
        assert_eq!(sink.messages(), vec!["kept value".to_string()]);
    }

    #[test]
    fn test_message_without_arguments_is_verbatim() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Debug);

        lp3_log_error!("100% sure about %d");
        let owned = String::from("owned %s text");
        lp3_log_info!(owned);

        assert_eq!(sink.messages(), vec!["100% sure about %d", "owned %s text"]);
    }

    #[test]
    fn test_bad_format_degrades_instead_of_failing() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Debug);

        lp3_log_info!("%d and %d", 1);

        assert_eq!(
            sink.messages(),
            vec!["%d and %d [format error: expected 2 argument(s), got 1]"]
        );
    }

    #[test]
    fn test_set_level_applies_immediately() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Error);

        lp3_log_info!("before");
        set_level(LogLevel::Info);
        assert_eq!(current_level(), Some(LogLevel::Info));
        lp3_log_info!("after");

        assert_eq!(sink.messages(), vec!["after"]);
    }

    #[test]
    fn test_variable_helper_emits_debug_pair() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Debug);

        lp3_log_set!("fps", 60);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Debug);
        assert_eq!(records[0].message, "fps=60");
        assert_eq!(sink.variables(), vec![("fps".to_string(), "60".to_string())]);
    }

    #[test]
    fn test_variable_helper_respects_threshold() {
        let _lock = serial();
        let (_system, sink) = capture(LogLevel::Info);

        lp3_log_set!("fps", 60);

        assert!(sink.records().is_empty());
        assert!(sink.variables().is_empty());
    }

    #[test]
    fn test_nested_guards_share_facility() {
        let _lock = serial();
        let (outer, sink) = capture(LogLevel::Info);

        let inner_sink = MemorySink::new();
        let inner = LogSystem::builder().level(LogLevel::Debug).sink(inner_sink.clone()).build();
        assert_eq!(current_level(), Some(LogLevel::Info));

        drop(inner);
        assert!(LogSystem::is_running());
        lp3_log_info!("still running");

        drop(outer);
        assert!(!LogSystem::is_running());
        assert_eq!(current_level(), None);
        lp3_log_critical!("after shutdown");

        assert_eq!(sink.messages(), vec!["still running"]);
        assert!(inner_sink.records().is_empty());
    }

    #[test]
    fn test_logging_without_facility_is_dropped() {
        let _lock = serial();
        assert_eq!(current_level(), None);
        assert!(!enabled(LogLevel::Critical));

        lp3_log_critical!("nobody is listening %d", 1);
        set_level(LogLevel::Debug);

        assert_eq!(current_level(), None);
    }

    #[test]
    fn test_console_sink_forwards_to_external_console() {
        let _lock = serial();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = LogConfig::new()
            .with_console_env_var("LP3_CORE_TEST_CONSOLE_UNSET")
            .with_console_address(listener.local_addr().unwrap().to_string());

        let system = LogSystem::builder().config(config).level(LogLevel::Info).build();
        let (accepted, _) = listener.accept().unwrap();
        lp3_log_warning!("shields at %d%%", 40);
        lp3_log_debug!("filtered");
        drop(system);

        let lines: Vec<String> = BufReader::new(accepted).lines().map(Result::unwrap).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("LOG WARNING "));
        assert!(lines[0].ends_with(" shields at 40%"));
    }

    #[test]
    fn test_log_crate_records_are_bridged() {
        let _lock = serial();
        let sink = MemorySink::new();
        let _system = LogSystem::builder()
            .level(LogLevel::Info)
            .sink(sink.clone())
            .bridge_log_crate(true)
            .build();

        log::info!("loaded {} assets", 3);
        log::debug!("filtered");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(records[0].message, "loaded 3 assets");
        assert!(records[0].file.ends_with("facility.rs"));
    }

    #[test]
    fn test_failing_display_does_not_panic() {
        let _lock = serial();
        let sink = MemorySink::new();
        let _system = LogSystem::builder()
            .level(LogLevel::Debug)
            .sink(sink.clone())
            .bridge_log_crate(true)
            .build();

        lp3_log_set!("hp", Failing);
        lp3_log_set!(Failing, 3);
        lp3_log_debug!("value %s", Failing);
        log::debug!("bridged {}", Failing);

        assert_eq!(sink.messages(), vec!["hp=", "=3", "value ", "bridged "]);
        assert_eq!(
            sink.variables(),
            vec![("hp".to_string(), String::new()), (String::new(), "3".to_string())]
        );
    }

    #[test]
    fn test_unreachable_console_falls_back_to_stdout() {
        let _lock = serial();
        let closed = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = closed.local_addr().unwrap().to_string();
        drop(closed);
        let config = LogConfig::new()
            .with_console_env_var("LP3_CORE_TEST_CONSOLE_UNSET")
            .with_console_address(address);

        let (_sink, console) = select_sink(&config);
        assert!(console.is_none());

        let system = LogSystem::builder().config(config).level(LogLevel::Debug).build();
        assert!(LogSystem::is_running());
        assert_eq!(current_level(), Some(LogLevel::Debug));
        drop(system);
        assert!(!LogSystem::is_running());
    }

    #[test]
    fn test_sink_may_query_and_adjust_the_facility() {
        let _lock = serial();
        let running = Arc::new(Mutex::new(Vec::new()));
        let _system = LogSystem::builder()
            .level(LogLevel::Debug)
            .sink(Inspecting { running: Arc::clone(&running) })
            .build();

        lp3_log_info!("first");
        assert_eq!(current_level(), Some(LogLevel::Error));
        lp3_log_info!("filtered");
        lp3_log_error!("second");

        assert_eq!(*running.lock().unwrap(), vec![true, true]);
    }
}
