//! Configuration validation utilities.

use super::models::*;
use super::ConfigError;

/// Validate the entire configuration.
pub fn validate_config(config: &RenownConfig) -> Result<(), ConfigError> {
    validate_cache_config(&config.cache)?;
    validate_scheduler_config(&config.scheduler)?;
    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.capacity == 0 {
        return Err(ConfigError::ValidationError(
            "cache capacity must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.inactivity_days == 0 {
        return Err(ConfigError::ValidationError(
            "inactivity days must be positive".to_string(),
        ));
    }
    if !(config.decay_factor > 0.0 && config.decay_factor < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "decay factor must be in (0, 1), got {}",
            config.decay_factor
        )));
    }
    if !(0.0..=1.0).contains(&config.similarity_threshold) {
        return Err(ConfigError::ValidationError(format!(
            "similarity threshold must be in [0, 1], got {}",
            config.similarity_threshold
        )));
    }
    if config.shard_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "shard concurrency must be positive".to_string(),
        ));
    }
    if config.maintenance_interval_secs == 0
        || config.popular_terms_interval_secs == 0
        || config.similarity_interval_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "scheduler intervals must be positive".to_string(),
        ));
    }
    Ok(())
}
