//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable costs of identity obfuscation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trace added by every `cloak`
    pub cloak_penalty: u64,
    /// Trace added by every `spoof` attempt
    pub spoof_penalty: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cloak_penalty: 5,
            spoof_penalty: 3,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
