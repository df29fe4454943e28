//! CLI configuration loading and merging.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Explicit `--config <path>` (replaces discovery)
//! 3. Local config file (./.relayrc)
//! 4. Global config file (~/.relay/config.toml)
//! 5. Defaults

use relay_codegen::{CodegenResult, RegistryEntry, SerializationRegistry};
use relay_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Extra serializer pairs, added on top of the built-in ones
    #[serde(default)]
    pub registry: Vec<RegistryEntry>,
}

#[derive(Debug, Error)]
pub enum RelayConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

pub type RelayConfigResult<T> = std::result::Result<T, RelayConfigError>;

impl RelayConfig {
    pub fn load_from_file(path: &Path) -> RelayConfigResult<Self> {
        if !path.exists() {
            return Err(RelayConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| RelayConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| RelayConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    pub fn default_global_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".relay").join("config.toml")
    }

    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".relayrc")
    }

    /// Like `load_from_file`, but a missing file is `None` rather than an error.
    pub fn load_if_present(path: &Path) -> RelayConfigResult<Option<Self>> {
        match Self::load_from_file(path) {
            Ok(config) => Ok(Some(config)),
            Err(RelayConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load global then local config; local values win.
    /// A config file that exists but cannot be read or parsed is an error.
    pub fn discover_and_load() -> RelayConfigResult<Self> {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            if let Some(found) = Self::load_if_present(&path)? {
                config.merge(found);
            }
        }

        Ok(config)
    }

    /// Merge `other` into `self`. Set values in `other` win; registry entries accumulate.
    pub fn merge(&mut self, other: Self) {
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.storage != StorageConfig::default() {
            self.storage = other.storage;
        }
        self.registry.extend(other.registry);
    }

    /// Built-in serializer pairs plus any configured ones.
    pub fn build_registry(&self) -> CodegenResult<SerializationRegistry> {
        self.registry
            .iter()
            .cloned()
            .try_fold(SerializationRegistry::builder().with_defaults()?, |builder, entry| builder.register(entry))
            .map(|builder| builder.build())
    }
}
