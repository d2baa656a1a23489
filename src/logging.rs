//! Injected logging for the streaming client.
//!
//! There is no process-wide log level.  Every component that logs receives a
//! [`LogContext`] at construction; the context carries the threshold and the
//! [`StreamLogger`] that records are forwarded to.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a log record.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail: requests, frames, state transitions.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Error returned when parsing an invalid log level string.
#[derive(Debug)]
pub struct LogLevelParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for LogLevelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown log level: {}", self.invalid_value)
    }
}

impl std::error::Error for LogLevelParseError {}

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(LogLevelParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// One log record handed to a [`StreamLogger`].
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    /// Severity.
    pub level: LogLevel,
    /// Component that emitted the record, e.g. `CONNECTION`.
    pub component: &'a str,
    /// Human-readable message.
    pub message: &'a str,
    /// Optional structured payload.
    pub data: Option<&'a Value>,
}

/// A sink for log records emitted by the streaming client.
///
/// Implement this trait to route connection, frame, and session diagnostics
/// to your own logging backend.
///
/// # Example
///
/// ```rust,ignore
/// use agentstream::{LogRecord, StreamLogger};
///
/// struct StderrLogger;
///
/// impl StreamLogger for StderrLogger {
///     fn log(&self, record: &LogRecord<'_>) {
///         eprintln!("[{}] {} {}", record.level, record.component, record.message);
///     }
/// }
/// ```
pub trait StreamLogger: Send + Sync {
    /// Record one entry.  Only called for records at or above the context's
    /// threshold.
    fn log(&self, record: &LogRecord<'_>);
}

/// Forwards records to the `tracing` ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl StreamLogger for TracingLogger {
    fn log(&self, record: &LogRecord<'_>) {
        let data = record.data.map(Value::to_string).unwrap_or_default();
        let component = record.component;
        let message = record.message;
        match record.level {
            LogLevel::Debug => tracing::debug!(component, data = %data, "{message}"),
            LogLevel::Info => tracing::info!(component, data = %data, "{message}"),
            LogLevel::Warn => tracing::warn!(component, data = %data, "{message}"),
            LogLevel::Error => tracing::error!(component, data = %data, "{message}"),
        }
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl StreamLogger for NullLogger {
    fn log(&self, _: &LogRecord<'_>) {}
}

/// The logging handle injected into each component.
#[derive(Clone)]
pub struct LogContext {
    level: LogLevel,
    logger: Arc<dyn StreamLogger>,
}

impl LogContext {
    /// Creates a context that forwards records at or above `level` to `logger`.
    pub fn new(level: LogLevel, logger: Arc<dyn StreamLogger>) -> Self {
        Self { level, logger }
    }

    /// Creates a context backed by [`TracingLogger`].
    pub fn tracing(level: LogLevel) -> Self {
        Self::new(level, Arc::new(TracingLogger))
    }

    /// Creates a context that logs nothing.
    pub fn disabled() -> Self {
        Self::new(LogLevel::Error, Arc::new(NullLogger))
    }

    /// The threshold of this context.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns true if a record at `level` would be forwarded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    /// Forwards a record if it passes the threshold.
    pub fn log(&self, level: LogLevel, component: &str, message: &str, data: Option<&Value>) {
        if self.enabled(level) {
            self.logger.log(&LogRecord {
                level,
                component,
                message,
                data,
            });
        }
    }

    /// Logs at debug level.
    pub fn debug(&self, component: &str, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Debug, component, message, data);
    }

    /// Logs at info level.
    pub fn info(&self, component: &str, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Info, component, message, data);
    }

    /// Logs at warn level.
    pub fn warn(&self, component: &str, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Warn, component, message, data);
    }

    /// Logs at error level.
    pub fn error(&self, component: &str, message: &str, data: Option<&Value>) {
        self.log(LogLevel::Error, component, message, data);
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::tracing(LogLevel::default())
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
