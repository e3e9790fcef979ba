//! Configuration loader.
//!
//! Layers environment variables (prefix `RENOWN_`, nested fields separated
//! by `_`, e.g. `RENOWN_LOGGING_LEVEL=debug`) over the built-in defaults.

use figment::{
    providers::{Env, Serialized},
    Figment,
};

use super::{models::RenownConfig, validation, ConfigError, Result, ENV_PREFIX};

/// Configuration loader that handles loading from multiple sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    figment: Figment,
}

impl ConfigLoader {
    /// Create a new configuration loader seeded with default values.
    pub fn new() -> Self {
        let figment = Figment::new().merge(Serialized::defaults(RenownConfig::default()));
        Self { figment }
    }

    /// Load configuration overrides from environment variables.
    pub fn load_env(mut self) -> Self {
        self.figment = self.figment.merge(Env::prefixed(ENV_PREFIX).split("_"));
        self
    }

    /// Merge a custom figment provider.
    pub fn merge<T: figment::Provider>(mut self, provider: T) -> Self {
        self.figment = self.figment.merge(provider);
        self
    }

    /// Extract and validate the configuration.
    pub fn extract(&self) -> Result<RenownConfig> {
        let config: RenownConfig = self
            .figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
