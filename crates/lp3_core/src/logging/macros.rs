//! Leveled logging macros
//!
//! Every macro records `file!()` and `line!()` of its call site and checks the
//! threshold before touching its arguments.

/// Log at an explicit [`LogLevel`](crate::logging::LogLevel)
///
/// With only a message the text is delivered verbatim. With arguments the
/// message is a format string, see [`format_message`](crate::logging::format_message).
///
/// ```rust
/// use lp3_core::{lp3_log, logging::LogLevel};
///
/// lp3_log!(LogLevel::Info, "loaded %d sprites from %s", 12, "atlas.png");
/// ```
#[macro_export]
macro_rules! lp3_log {
    ($level:expr, $message:expr $(,)?) => {{
        let level: $crate::logging::LogLevel = $level;
        if $crate::logging::enabled(level) {
            $crate::logging::write_message(
                ::core::file!(),
                ::core::line!(),
                level,
                ::core::convert::AsRef::<str>::as_ref(&$message),
            );
        }
    }};
    ($level:expr, $format:expr, $($arg:expr),+ $(,)?) => {{
        let level: $crate::logging::LogLevel = $level;
        if $crate::logging::enabled(level) {
            $crate::logging::write_formatted(
                ::core::file!(),
                ::core::line!(),
                level,
                ::core::convert::AsRef::<str>::as_ref(&$format),
                &[$(&$arg as &dyn ::core::fmt::Display),+],
            );
        }
    }};
}

/// Log something that will probably end the program
#[macro_export]
macro_rules! lp3_log_critical {
    ($($arg:tt)+) => {
        $crate::lp3_log!($crate::logging::LogLevel::Critical, $($arg)+)
    };
}

/// Log an error
#[macro_export]
macro_rules! lp3_log_error {
    ($($arg:tt)+) => {
        $crate::lp3_log!($crate::logging::LogLevel::Error, $($arg)+)
    };
}

/// Log something bad that the program can survive
#[macro_export]
macro_rules! lp3_log_warning {
    ($($arg:tt)+) => {
        $crate::lp3_log!($crate::logging::LogLevel::Warning, $($arg)+)
    };
}

/// Log non-important information
#[macro_export]
macro_rules! lp3_log_info {
    ($($arg:tt)+) => {
        $crate::lp3_log!($crate::logging::LogLevel::Info, $($arg)+)
    };
}

/// Log debug output. Fine to call every frame.
#[macro_export]
macro_rules! lp3_log_debug {
    ($($arg:tt)+) => {
        $crate::lp3_log!($crate::logging::LogLevel::Debug, $($arg)+)
    };
}

/// Publish a watched variable
///
/// Writes a Debug line `name=value`. An external console additionally
/// receives the pair as a live variable update.
///
/// ```rust
/// let frame = 120;
/// lp3_core::lp3_log_set!("frame", frame);
/// ```
#[macro_export]
macro_rules! lp3_log_set {
    ($name:expr, $value:expr $(,)?) => {{
        if $crate::logging::enabled($crate::logging::LogLevel::Debug) {
            $crate::logging::write_variable(::core::file!(), ::core::line!(), &$name, &$value);
        }
    }};
}
