//! Cache sizing configuration.
//!
//! Capacities may be given in a TOML file:
//!
//! ```toml
//! handle-limit = 4096
//! verifier-limit = 256
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_HANDLE_LIMIT: usize = 1024;

fn default_handle_limit() -> usize {
    DEFAULT_HANDLE_LIMIT
}

/// Capacities of the handle and listing caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CacheConfig {
    /// How many file handles stay live before the least recently used go stale.
    #[serde(default = "default_handle_limit")]
    pub handle_limit: usize,

    /// How many directory listings are cached. Falls back to `handle-limit` when unset.
    #[serde(default)]
    pub verifier_limit: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            handle_limit: DEFAULT_HANDLE_LIMIT,
            verifier_limit: None,
        }
    }
}

/// Errors loading a [`CacheConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more limits are unusable.
    #[error("Configuration validation errors: {0:?}")]
    ValidationErrors(Vec<String>),

    /// The file is not valid TOML for this schema.
    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    /// The file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CacheConfig {
    /// Validate the correctness of the configuration.
    ///
    /// Returns a list of validation error messages if any limit is unusable.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.handle_limit == 0 {
            errors.push("handle-limit must be at least 1.".to_owned());
        }
        if self.verifier_limit == Some(0) {
            errors.push("verifier-limit must be at least 1.".to_owned());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(ConfigError::ValidationErrors)?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = ?path, "Loading configuration file.");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Loads the file at `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// The handle cache capacity. Zero, which [`validate`](Self::validate) rejects, is raised
    /// to one.
    #[must_use]
    pub fn handle_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.handle_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// The listing cache capacity, defaulting to the handle capacity.
    #[must_use]
    pub fn verifier_capacity(&self) -> NonZeroUsize {
        self.verifier_limit
            .map_or_else(|| self.handle_capacity(), |limit| {
                NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN)
            })
    }
}
