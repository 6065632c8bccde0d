//! Structured logging setup.
//!
//! Tracing-based logging shared by the pipeline and its resilience
//! components. Every breaker transition, limiter degradation and cache
//! disable event is emitted as a structured record; boundary errors log at a
//! severity derived from their transport status (see
//! [`crate::error::ErrorReport::log`]).

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level: most detailed debugging information.
    Trace,
    /// Debug level: detailed debugging information.
    Debug,
    /// Info level: important business events.
    Info,
    /// Warn level: potential issues.
    Warn,
    /// Error level: error information.
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable formatted output.
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for production environments.
    Json,
}

/// Log configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level.
    pub level: LogLevel,
    /// Log format.
    pub format: LogFormat,
    /// Whether to show timestamps.
    pub show_time: bool,
    /// Whether to show thread IDs.
    pub show_thread_ids: bool,
    /// Whether to show the target module.
    pub show_target: bool,
    /// Whether to show span enter/close events (request spans).
    pub show_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            show_time: true,
            show_thread_ids: false,
            show_target: true,
            show_span_events: false,
        }
    }
}

impl LogConfig {
    /// Configuration for development environments.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            show_time: true,
            show_thread_ids: false,
            show_target: true,
            show_span_events: true,
        }
    }

    /// Configuration for production environments.
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            show_time: true,
            show_thread_ids: true,
            show_target: true,
            show_span_events: false,
        }
    }

    /// Configuration for test environments.
    pub fn test() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            show_time: false,
            show_thread_ids: false,
            show_target: false,
            show_span_events: false,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "brandex_core={},brandex_extractors={}",
                self.level, self.level
            ))
        })
    }

    fn span_events(&self) -> FmtSpan {
        if self.show_span_events {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the configured level when set. Panics if
/// a global subscriber is already installed; use [`try_init_logging`] where
/// that can happen.
///
/// # Examples
///
/// ```no_run
/// use brandex_core::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::production());
/// ```
pub fn init_logging(config: &LogConfig) {
    let env_filter = config.env_filter();

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_timer(fmt::time::time())
                .with_thread_ids(config.show_thread_ids)
                .with_target(config.show_target)
                .with_span_events(config.span_events())
                .with_filter(env_filter);

            tracing_subscriber::registry().with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_timer(fmt::time::time())
                .with_thread_ids(config.show_thread_ids)
                .with_target(config.show_target)
                .with_span_events(config.span_events())
                .with_filter(env_filter);

            tracing_subscriber::registry().with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_timer(fmt::time::time())
                .with_thread_ids(config.show_thread_ids)
                .with_target(config.show_target)
                .with_span_events(config.span_events())
                .with_filter(env_filter);

            tracing_subscriber::registry().with(fmt_layer).init();
        }
    }
}

/// Attempts to initialize the logging system, ignoring duplicate
/// initialization errors. Suitable for tests, where several suites may race
/// to install the subscriber.
pub fn try_init_logging(config: &LogConfig) {
    let env_filter = config.env_filter();

    let result = match config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_timer(fmt::time::time())
                .with_thread_ids(config.show_thread_ids)
                .with_target(config.show_target)
                .with_span_events(config.span_events())
                .with_filter(env_filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_timer(fmt::time::time())
                .with_thread_ids(config.show_thread_ids)
                .with_target(config.show_target)
                .with_span_events(config.span_events())
                .with_filter(env_filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_timer(fmt::time::time())
                .with_thread_ids(config.show_thread_ids)
                .with_target(config.show_target)
                .with_span_events(config.span_events())
                .with_filter(env_filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
    };

    let _ = result;
}
