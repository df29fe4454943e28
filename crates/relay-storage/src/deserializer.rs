use crate::artifact::DataLoader;
use crate::error::{StorageError, StorageResult};
use crate::location::StorageLocation;
use crate::store::ObjectStore;
use std::path::Path;
use tracing::debug;

/// Name of the file a remote artifact is downloaded into.
pub const DOWNLOAD_FILE_NAME: &str = "deserialized_dataloader.pth";

pub struct ArtifactDeserializer<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ArtifactDeserializer<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Rebuild the loader stored at `location`.
    ///
    /// Remote artifacts go through a temporary directory that is removed before this
    /// returns, on success or failure. Read/parse failures surface as
    /// [`StorageError::ArtifactLoad`]; object-store failures are returned unchanged.
    pub fn deserialize(&self, location: &StorageLocation) -> StorageResult<DataLoader> {
        match location {
            StorageLocation::Local(path) => load_artifact(path, location),
            StorageLocation::Remote { bucket, prefix } => {
                let tmp_dir = tempfile::Builder::new().prefix("relay-artifact").tempdir()?;
                let dest = tmp_dir.path().join(DOWNLOAD_FILE_NAME);
                debug!(store = self.store.id(), location = %location, dest = %dest.display(), "fetching artifact");

                self.store.download(bucket, prefix, &dest)?;
                let loader = load_artifact(&dest, location)?;
                tmp_dir.close()?;
                Ok(loader)
            }
        }
    }

    pub fn deserialize_str(&self, location: &str) -> StorageResult<DataLoader> {
        self.deserialize(&StorageLocation::parse(location)?)
    }
}

fn load_artifact(path: &Path, location: &StorageLocation) -> StorageResult<DataLoader> {
    DataLoader::load(path).map_err(|e| StorageError::ArtifactLoad {
        location: location.to_string(),
        message: e.to_string(),
    })
}
