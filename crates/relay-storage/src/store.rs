//! Object store adapters.
//!
//! The serializer and deserializer only need two blocking operations: push a local
//! file to `bucket/path` and pull `bucket/path` into a local file. Retry, auth and
//! listing are the adapter's own business.

use crate::error::StoreError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait ObjectStore: Send + Sync {
    /// Short identifier used in logs (e.g. `gcs`, `fs`).
    fn id(&self) -> &'static str;

    fn upload(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError>;

    fn download(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError>;
}

/// Object store backed by a local directory: `gs://<bucket>/<path>` maps to
/// `<root>/<bucket>/<path>`.
///
/// Used for offline development and tests.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn object_path(&self, bucket: &str, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.join(bucket), |acc, segment| acc.join(segment))
    }
}

impl ObjectStore for FsObjectStore {
    fn id(&self) -> &'static str {
        "fs"
    }

    fn upload(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError> {
        let dest = self.object_path(bucket, path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local_file, &dest)?;
        debug!(bucket, path, dest = %dest.display(), "stored object");
        Ok(())
    }

    fn download(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError> {
        let src = self.object_path(bucket, path);
        if !src.is_file() {
            return Err(StoreError::NotFound { bucket: bucket.to_string(), path: path.to_string() });
        }
        std::fs::copy(&src, local_file)?;
        debug!(bucket, path, dest = %local_file.display(), "fetched object");
        Ok(())
    }
}
