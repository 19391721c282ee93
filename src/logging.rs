//! Logging setup.
//!
//! Structured logging via the `tracing` crate. Besides a level threshold,
//! [`LogConfig`] can carry a source-tag filter: a prefix predicate applied
//! to each event's target, so output can be narrowed to one subsystem.

use tracing::Level;
use tracing_subscriber::{filter, fmt, prelude::*};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
    /// Only show events whose target starts with this prefix
    pub source_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: false,
            ansi_colors: true,
            source_filter: None,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
            ansi_colors: true,
            source_filter: None,
        }
    }

    /// Restrict output to events emitted under the given target prefix
    pub fn with_source_filter(mut self, prefix: &str) -> Self {
        self.source_filter = Some(prefix.to_string());
        self
    }

    /// Check whether an event target passes the source filter
    pub fn allows_target(&self, target: &str) -> bool {
        match &self.source_filter {
            Some(prefix) => target.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Initialize logging with the given configuration
///
/// Returns an error message if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> std::result::Result<(), String> {
    let level = config.level.to_tracing_level();
    let predicate = config.clone();

    let filter_layer = filter::filter_fn(move |meta| {
        *meta.level() <= level && predicate.allows_target(meta.target())
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(config.ansi_colors)
                .with_target(config.include_target)
                .compact(),
        )
        .with(filter_layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
