//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The crates only emit events; installing a subscriber is left to the host
//! application. These helpers cover the common setups.
//!
//! # Log Levels
//!
//! - `warn`: panicking tests, unknown fields in an access table
//! - `debug`: validation runs started/settled, submissions, resets
//! - `trace`: individual test outcomes, value writes, lock changes, store
//!   notifications
//!
//! Field values only appear in events when the form's
//! `logging.log_values` setting is on; otherwise they print as
//! [`REDACTED_VALUE`].
//!
//! # Usage
//!
//! ```no_run
//! use formstate_core::logging::{LogConfig, LogFormat, init_logging};
//!
//! init_logging(&LogConfig::default().with_format(LogFormat::Compact))?;
//! # Ok::<(), formstate_core::FormError>(())
//! ```

use std::fmt;
use std::io;

use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self as layer_fmt, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::Result;

/// Placeholder printed instead of a field value.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Displays a value, or [`REDACTED_VALUE`] when value logging is off.
pub struct Redacted<'a, T: ?Sized> {
    value: &'a T,
    reveal: bool,
}

/// Wrap `value` for a log field; formatting only happens if the event is
/// actually recorded.
pub fn redact_value<T: fmt::Debug + ?Sized>(value: &T, reveal: bool) -> Redacted<'_, T> {
    Redacted { value, reveal }
}

impl<T: fmt::Debug + ?Sized> fmt::Display for Redacted<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reveal {
            write!(f, "{:?}", self.value)
        } else {
            f.write_str(REDACTED_VALUE)
        }
    }
}

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter (error, warn, info, debug, trace).
    pub level: Level,
    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
    /// Whether to include target (module path) in log output.
    pub with_target: bool,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for machine parsing.
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_timestamps: false,
            with_target: false,
            with_ansi: true,
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    /// Set log level directly.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable timestamps.
    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.with_timestamps = enable;
        self
    }

    /// Enable or disable target (module path) in output.
    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    /// Set output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install a global subscriber writing to stderr.
///
/// # Errors
///
/// Returns [`FormError::Logging`](crate::FormError::Logging) if a global
/// subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    init_logging_with_writer(config, io::stderr)
}

/// Install a global subscriber with a custom writer (useful for testing).
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);

    match config.format {
        LogFormat::Json => {
            let layer = layer_fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(config.with_target);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        LogFormat::Compact => {
            let layer = layer_fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);

            if config.with_timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init()?;
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .try_init()?;
            }
        }
        LogFormat::Pretty => {
            let layer = layer_fmt::layer()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);

            if config.with_timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init()?;
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .try_init()?;
            }
        }
    }
    Ok(())
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG` env var.
fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Other crates stay at warn to keep form events readable
        EnvFilter::new(format!(
            "warn,formstate_core={level},formstate_model={level},\
             formstate_store={level},formstate_validate={level}",
            level = level_str
        ))
    })
}
