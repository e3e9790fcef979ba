//! Configuration system for Renown.
//!
//! Ambient knobs only: logging, cache sizing, scheduler intervals, and
//! batch parameters. The scoring constants (EWMA smoothing factor, anomaly
//! threshold, tier bands) are fixed by observed behavior and deliberately
//! not configurable.

mod builder;
mod loader;
mod models;
mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;
pub use validation::validate_config;

/// Environment variable prefix for Renown configuration
pub const ENV_PREFIX: &str = "RENOWN_";

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred during environment loading
    #[error("failed to load environment variables: {0}")]
    EnvLoadError(String),

    /// Error occurred during validation
    #[error("configuration validation error: {0}")]
    ValidationError(String),

    /// Error occurred during parsing
    #[error("configuration parsing error: {0}")]
    ParseError(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
