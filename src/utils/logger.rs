//! Logging utilities
//!
//! Provides logging configuration and helpers.

use std::fmt;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tracing_level())
    }
}

/// Build the crate-scoped filter; `RUST_LOG` directives are appended
pub fn env_filter(level: LogLevel) -> EnvFilter {
    let mut directives = format!("async_junit={}", level.to_tracing_level());
    if let Ok(extra) = std::env::var("RUST_LOG") {
        if !extra.is_empty() {
            directives.push(',');
            directives.push_str(&extra);
        }
    }
    EnvFilter::new(directives)
}

/// Initialize the logger with specified level.
///
/// Returns `false` when a global subscriber was already set.
pub fn init_logger(level: LogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
