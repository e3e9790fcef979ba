//! Configuration model types.

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Maximum level to emit
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Whether to write to stdout
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            stdout: true,
        }
    }
}

/// Recommendation read-cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Maximum cached rankings
    pub capacity: usize,
    /// Seconds an entry stays valid after insertion
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            ttl_seconds: 300,
        }
    }
}

/// Scheduled-job configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Days without activity before a score starts decaying
    pub inactivity_days: u32,
    /// Multiplier applied to inactive scores, in (0, 1)
    pub decay_factor: f64,
    /// Minimum similarity the scheduled batch persists, in [0, 1]
    pub similarity_threshold: f64,
    /// Bounded concurrency of the pairwise similarity pass
    pub shard_concurrency: usize,
    /// Seconds between daily-maintenance runs (decay + snapshot promotion)
    pub maintenance_interval_secs: u64,
    /// Seconds between popular-term refreshes
    pub popular_terms_interval_secs: u64,
    /// Seconds between collaborative-filtering batches
    pub similarity_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            inactivity_days: 30,
            decay_factor: 0.95,
            similarity_threshold: 0.1,
            shard_concurrency: 4,
            maintenance_interval_secs: 86_400,
            popular_terms_interval_secs: 3_600,
            similarity_interval_secs: 86_400,
        }
    }
}

/// Top-level Renown configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RenownConfig {
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub scheduler: SchedulerConfig,
}
