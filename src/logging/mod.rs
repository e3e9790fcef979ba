//! Structured logging infrastructure for Renown.
//!
//! Configurable setup over the tracing crate; tolerant of an already
//! installed global subscriber so embedding applications keep control of
//! their own logging.

use tracing::Level;

use crate::config::{LogFormat, LogLevel, LoggingConfig};

/// Error type for logging operations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Error in subscriber setup
    #[error("subscriber setup failed: {0}")]
    SubscriberError(String),
}

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Initialize the logging system with the given configuration.
///
/// Returns `Ok(())` when a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.stdout {
        return Ok(());
    }

    let level = level_for(config.level);
    let result = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_max_level(level)
            .with_target(true)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_max_level(level)
            .with_target(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_max_level(level)
            .with_target(true)
            .try_init(),
    };

    match result {
        Ok(()) => Ok(()),
        // Another subscriber won the race; that is fine for a library.
        Err(e) if e.to_string().contains("has already been set") => Ok(()),
        Err(e) => Err(LogError::SubscriberError(e.to_string())),
    }
}

fn level_for(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}
