//! Diagnostics for the LTC renderer
//!
//! Every component reports through one process-wide `Logger`, addressed
//! by a `"ltc::<Component>"` source string. The default logger prints
//! colored lines to stderr; applications and tests swap it with
//! `set_logger`. Errors also carry the file:line of the call site.

use chrono::{DateTime, Local};
use colored::*;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

/// Receiver of every diagnostic the renderer emits
///
/// # Example
///
/// ```no_run
/// use ltc_renderer::ltc::log::{Logger, LogEntry, LogSeverity};
///
/// struct ErrorsOnly;
///
/// impl Logger for ErrorsOnly {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity == LogSeverity::Error {
///             eprintln!("{}: {}", entry.source, entry.message);
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One diagnostic
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, e.g. "ltc::TextureLoader"
    pub source: String,
    pub message: String,
    /// Call site, set for errors only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// `[SEVERITY] [source] message (file:line)` without timestamp or colors
    pub fn plain_line(&self) -> String {
        match (self.file, self.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] {} ({}:{})",
                self.severity.label(),
                self.source,
                self.message,
                file,
                line
            ),
            _ => format!("[{}] [{}] {}", self.severity.label(), self.source, self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame chatter (accumulation resets, cache misses)
    Trace,
    Debug,
    Info,
    /// Degraded rendering that keeps going
    Warn,
    Error,
}

impl LogSeverity {
    /// Five-character tag used in printed lines
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(&self) -> ColoredString {
        match self {
            LogSeverity::Trace => self.label().bright_black(),
            LogSeverity::Debug => self.label().cyan(),
            LogSeverity::Info => self.label().green(),
            LogSeverity::Warn => self.label().yellow(),
            LogSeverity::Error => self.label().red().bold(),
        }
    }
}

/// Colored stderr output: `[local time] [SEVERITY] [source] message`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let local: DateTime<Local> = entry.timestamp.into();
        let location = match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line).bright_black().to_string(),
            _ => String::new(),
        };
        eprintln!(
            "[{}] [{}] [{}] {}{}",
            local.format("%H:%M:%S%.3f"),
            entry.severity.colored_label(),
            entry.source.bright_blue(),
            entry.message,
            location
        );
    }
}

// ============================================================================
// Global logger
// ============================================================================

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Entries below this severity are dropped before reaching the logger
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(LogSeverity::Trace as u8);

fn global() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Route all renderer diagnostics to `logger`
pub fn set_logger<L: Logger + 'static>(logger: L) {
    if let Ok(mut slot) = global().write() {
        *slot = Box::new(logger);
    }
}

/// Go back to `DefaultLogger` and let every severity through
pub fn reset_logger() {
    if let Ok(mut slot) = global().write() {
        *slot = Box::new(DefaultLogger);
    }
    MIN_SEVERITY.store(LogSeverity::Trace as u8, Ordering::Relaxed);
}

/// Drop entries less severe than `severity`
pub fn set_min_severity(severity: LogSeverity) {
    MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
}

fn emit(severity: LogSeverity, source: &str, message: String, location: Option<(&'static str, u32)>) {
    if (severity as u8) < MIN_SEVERITY.load(Ordering::Relaxed) {
        return;
    }
    let entry = LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: location.map(|(file, _)| file),
        line: location.map(|(_, line)| line),
    };
    if let Ok(logger) = global().read() {
        logger.log(&entry);
    }
}

/// Backend of `ltc_trace!` .. `ltc_warn!`
pub fn log(severity: LogSeverity, source: &str, message: String) {
    emit(severity, source, message, None);
}

/// Backend of `ltc_error!`, `ltc_err!` and `ltc_bail!`
pub fn log_detailed(severity: LogSeverity, source: &str, message: String, file: &'static str, line: u32) {
    emit(severity, source, message, Some((file, line)));
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __ltc_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::$severity, $source, format!($($arg)*))
    };
}

/// `ltc_renderer::ltc_trace!("ltc::Program", "cache miss {}", name)`
#[macro_export]
macro_rules! ltc_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__ltc_log!(Trace, $source, $($arg)*) };
}

#[macro_export]
macro_rules! ltc_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__ltc_log!(Debug, $source, $($arg)*) };
}

#[macro_export]
macro_rules! ltc_info {
    ($source:expr, $($arg:tt)*) => { $crate::__ltc_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! ltc_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__ltc_log!(Warn, $source, $($arg)*) };
}

/// Error with the call site attached
#[macro_export]
macro_rules! ltc_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

/// Log an error and build the `Error` variant `$kind` with the same message
///
/// ```no_run
/// let err = ltc_renderer::ltc_err!("ltc::Texture", InvalidResource, "bad size {}", 3);
/// ```
#[macro_export]
macro_rules! ltc_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::ltc_error!($source, "{}", message);
        $crate::ltc::Error::$kind(message)
    }};
}

/// `ltc_err!` then `return Err(..)`
#[macro_export]
macro_rules! ltc_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::ltc_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
