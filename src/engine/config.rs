//! Engine Configuration

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combinability::DEFAULT_EXHAUSTIVE_SEARCH_LIMIT;

/// Errors loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Eligible promotion count above which combinations are chosen greedily
    pub exhaustive_search_limit: usize,

    /// Whether percentage rewards above 100% pass validation
    pub allow_percentage_over_100: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exhaustive_search_limit: DEFAULT_EXHAUSTIVE_SEARCH_LIMIT,
            allow_percentage_over_100: false,
        }
    }
}

impl EngineConfig {
    /// Parse a config from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the YAML is malformed or has unknown keys.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Load a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Return a copy of this config with a different search limit.
    #[must_use]
    pub fn with_exhaustive_search_limit(self, exhaustive_search_limit: usize) -> Self {
        Self {
            exhaustive_search_limit,
            ..self
        }
    }

    /// Return a copy of this config with percentages above 100% allowed or not.
    #[must_use]
    pub fn with_percentage_over_100(self, allow: bool) -> Self {
        Self {
            allow_percentage_over_100: allow,
            ..self
        }
    }
}
