//! Structured console logging for the realtime client
//!
//! This module provides a small, tag-based logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Colored, column-aligned console output
//!
//! ## Usage
//!
//! ```rust
//! use procureflow_realtime::logger::{self, LogTag};
//!
//! logger::error(LogTag::Transport, "Connection refused");
//! logger::warning(LogTag::Realtime, "Message not sent: not connected");
//! logger::info(LogTag::Simulator, "Simulated transport connected");
//! logger::debug(LogTag::Registry, "Dispatching to 3 subscribers"); // Only if --debug-registry
//! logger::verbose(LogTag::Transport, "Raw frame: ..."); // Only if --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup:
//! ```rust
//! procureflow_realtime::logger::init();
//! ```

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from command-line arguments
///
/// Scans for `--debug-<module>`, `--verbose`, `--verbose-<module>` and
/// `--quiet`. Logging before `init()` uses the default configuration.
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless filtered by tag)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the `--debug-<module>` flag for the tag is present.
///
/// # Example
/// ```rust
/// use procureflow_realtime::logger::{self, LogTag};
///
/// // Only shown with --debug-transport
/// logger::debug(LogTag::Transport, "Heartbeat sent");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose or --verbose-<module>)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
