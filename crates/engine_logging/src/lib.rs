#![deny(missing_docs)]
//! Shared logging utilities for the enricher workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a helper for keeping failure reasons short in log lines, and a minimal test
//! initializer for the global logger.

/// Default number of characters kept by [`truncate_for_log`] callers.
pub const DEFAULT_REASON_CHARS: usize = 120;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Shortens `message` to at most `max_chars` characters, appending `...` when cut.
///
/// Multi-line messages (driver stack traces, HTML error bodies) are cut at the
/// first line break so a single failure stays on a single log line.
pub fn truncate_for_log(message: &str, max_chars: usize) -> String {
    let first_line = message.lines().next().unwrap_or("").trim_end();
    let multi_line = first_line.len() < message.trim_end().len();
    let mut chars = first_line.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &first_line[..cut]),
        None if multi_line => format!("{first_line}..."),
        None => first_line.to_string(),
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
