//! Object store configuration.

use crate::error::{StorageError, StorageResult};
use crate::gcs::{GcsObjectStore, DEFAULT_GCS_ENDPOINT};
use crate::store::{FsObjectStore, ObjectStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

fn default_endpoint() -> String {
    DEFAULT_GCS_ENDPOINT.to_string()
}

fn default_token_env() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".to_string()
}

/// `[storage]` section of the relay config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// GCS JSON API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token; takes precedence over `token_env`
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Serve `gs://` locations from this directory instead of GCS
    #[serde(default)]
    pub fs_root: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { endpoint: default_endpoint(), token: None, token_env: default_token_env(), fs_root: None }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(&self.token_env).ok())
            .filter(|t| !t.trim().is_empty())
    }

    /// Build the configured object store.
    pub fn build_store(&self) -> StorageResult<Box<dyn ObjectStore>> {
        if let Some(root) = &self.fs_root {
            debug!(root = %root.display(), "using filesystem object store");
            return Ok(Box::new(FsObjectStore::new(root.clone())));
        }

        if self.endpoint.trim().is_empty() {
            return Err(StorageError::Config("storage.endpoint must not be empty".to_string()));
        }
        debug!(endpoint = %self.endpoint, "using GCS object store");
        Ok(Box::new(GcsObjectStore::new(self.endpoint.clone(), self.resolve_token())))
    }
}
