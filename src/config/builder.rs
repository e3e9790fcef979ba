//! Configuration builder.

use super::{models::*, validation, Result};

/// Builder for creating [`RenownConfig`] instances.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: RenownConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for [`ConfigBuilder::new`], reading like the intent at call
    /// sites: `ConfigBuilder::defaults().build()`.
    pub fn defaults() -> Self {
        Self::new()
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set the log output format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Enable or disable stdout logging.
    pub fn with_stdout_logging(mut self, stdout: bool) -> Self {
        self.config.logging.stdout = stdout;
        self
    }

    /// Set the recommendation cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache.capacity = capacity;
        self
    }

    /// Set the recommendation cache TTL in seconds.
    pub fn with_cache_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.config.cache.ttl_seconds = ttl_seconds;
        self
    }

    /// Set the inactivity window and decay factor for the decay job.
    pub fn with_decay(mut self, inactivity_days: u32, decay_factor: f64) -> Self {
        self.config.scheduler.inactivity_days = inactivity_days;
        self.config.scheduler.decay_factor = decay_factor;
        self
    }

    /// Set the similarity threshold used by the scheduled batch.
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.scheduler.similarity_threshold = threshold;
        self
    }

    /// Set the bounded concurrency of the pairwise similarity pass.
    pub fn with_shard_concurrency(mut self, shards: usize) -> Self {
        self.config.scheduler.shard_concurrency = shards;
        self
    }

    /// Validate and build the final configuration.
    pub fn build(self) -> Result<RenownConfig> {
        validation::validate_config(&self.config)?;
        Ok(self.config)
    }
}
