//! Location-aware serialization of data loader artifacts.
//!
//! Where the loader lands and what happens to its origin data depends on two facts:
//! whether the origin is already in object storage, and whether the target root is.

use crate::artifact::{artifact_file_name, artifact_tag, DataLoader, ARTIFACT_EXTENSION};
use crate::error::{StorageError, StorageResult};
use crate::location::{join_blob_path, StorageLocation};
use crate::store::ObjectStore;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Locations produced by one serialization.
///
/// `origin_location` is `Some` only when the serialized loader had an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedArtifactRecord {
    pub artifact_location: StorageLocation,
    pub origin_location: Option<StorageLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeStrategy {
    /// Origin already durable; only the loader is stored.
    RemoteOrigin,
    /// Loader written straight to the local target; origin passed through.
    LocalToLocal,
    /// Origin file and loader both uploaded to the target bucket.
    LocalToRemoteWithOrigin,
    /// Only the loader is uploaded.
    LocalToRemoteWithoutOrigin,
}

impl SerializeStrategy {
    #[must_use]
    pub fn select(origin: Option<&StorageLocation>, target_root: &StorageLocation) -> Self {
        match (origin, target_root) {
            (Some(origin), _) if origin.is_remote() => Self::RemoteOrigin,
            (_, StorageLocation::Local(_)) => Self::LocalToLocal,
            (Some(_), StorageLocation::Remote { .. }) => Self::LocalToRemoteWithOrigin,
            (None, StorageLocation::Remote { .. }) => Self::LocalToRemoteWithoutOrigin,
        }
    }
}

pub struct ArtifactSerializer<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ArtifactSerializer<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Store `artifact` under `target_root` as `my_<role>_dataloader.pth`.
    ///
    /// Object-store failures are returned as-is; nothing is retried.
    pub fn serialize(
        &self,
        target_root: &StorageLocation,
        artifact: &DataLoader,
        role: &str,
    ) -> StorageResult<SerializedArtifactRecord> {
        let origin = artifact.origin.as_ref();
        let strategy = SerializeStrategy::select(origin, target_root);
        debug!(target_root = %target_root, role, ?strategy, "selected serialization strategy");

        if strategy == SerializeStrategy::RemoteOrigin && !target_root.is_remote() {
            warn!(
                target_root = %target_root,
                "remote origin with a local target; writing the loader locally and leaving the origin in place"
            );
        }

        let origin_location = match (strategy, origin, target_root) {
            (
                SerializeStrategy::LocalToRemoteWithOrigin,
                Some(StorageLocation::Local(origin_path)),
                StorageLocation::Remote { bucket, prefix },
            ) => Some(self.upload_origin(bucket, prefix, origin_path, role)?),
            _ => origin.cloned(),
        };

        let artifact_location = target_root.join(&artifact_file_name(role));
        self.store_artifact(&artifact_location, artifact, role)?;

        let origin_display = origin_location.as_ref().map_or_else(|| "-".to_string(), ToString::to_string);
        info!(artifact = %artifact_location, origin = %origin_display, "serialized {} dataloader", role);

        Ok(SerializedArtifactRecord { artifact_location, origin_location })
    }

    /// Copy the local origin file next to the loader as `<role>_<basename>`.
    fn upload_origin(
        &self,
        bucket: &str,
        prefix: &str,
        origin_path: &Path,
        role: &str,
    ) -> StorageResult<StorageLocation> {
        let base_name = origin_path.file_name().ok_or_else(|| {
            StorageError::InvalidLocation(format!("origin has no file name: {}", origin_path.display()))
        })?;
        let blob_path = join_blob_path(prefix, &format!("{role}_{}", base_name.to_string_lossy()));

        self.store.upload(bucket, &blob_path, origin_path)?;
        Ok(StorageLocation::Remote { bucket: bucket.to_string(), prefix: blob_path })
    }

    fn store_artifact(&self, location: &StorageLocation, artifact: &DataLoader, role: &str) -> StorageResult<()> {
        match location {
            StorageLocation::Local(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                artifact.save(path)
            }
            StorageLocation::Remote { bucket, prefix } => {
                // Removed on drop, so a failed upload still cleans up.
                let mut tmp = tempfile::Builder::new()
                    .prefix(&artifact_tag(role))
                    .suffix(&format!(".{ARTIFACT_EXTENSION}"))
                    .tempfile()?;
                artifact.write_to(tmp.as_file_mut())?;
                tmp.as_file_mut().flush()?;

                debug!(store = self.store.id(), tmp = %tmp.path().display(), "uploading serialized loader");
                self.store.upload(bucket, prefix, tmp.path())?;
                tmp.close()?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Dataset;
    use crate::error::StoreError;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records uploads and keeps a copy of each uploaded file's bytes.
    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<(String, String, PathBuf, Vec<u8>)>>,
        fail: bool,
    }

    impl ObjectStore for RecordingStore {
        fn id(&self) -> &'static str {
            "recording"
        }

        fn upload(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError> {
            let bytes = std::fs::read(local_file)?;
            self.uploads.lock().unwrap().push((
                bucket.to_string(),
                path.to_string(),
                local_file.to_path_buf(),
                bytes,
            ));
            if self.fail {
                return Err(StoreError::Status {
                    status: 500,
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn download(&self, bucket: &str, path: &str, _local_file: &Path) -> Result<(), StoreError> {
            Err(StoreError::NotFound { bucket: bucket.to_string(), path: path.to_string() })
        }
    }

    fn loader() -> DataLoader {
        DataLoader::new(Dataset::new(vec![serde_json::json!([1.0, 2.0])]))
    }

    #[test]
    fn test_strategy_selection() {
        let remote_target = StorageLocation::remote("bkt", "out");
        let local_target = StorageLocation::local("/tmp/out").unwrap();
        let remote_origin = StorageLocation::remote("src", "train.csv");
        let local_origin = StorageLocation::local("/data/train.csv").unwrap();

        assert_eq!(SerializeStrategy::select(Some(&remote_origin), &remote_target), SerializeStrategy::RemoteOrigin);
        assert_eq!(SerializeStrategy::select(Some(&remote_origin), &local_target), SerializeStrategy::RemoteOrigin);
        assert_eq!(SerializeStrategy::select(Some(&local_origin), &local_target), SerializeStrategy::LocalToLocal);
        assert_eq!(SerializeStrategy::select(None, &local_target), SerializeStrategy::LocalToLocal);
        assert_eq!(
            SerializeStrategy::select(Some(&local_origin), &remote_target),
            SerializeStrategy::LocalToRemoteWithOrigin
        );
        assert_eq!(SerializeStrategy::select(None, &remote_target), SerializeStrategy::LocalToRemoteWithoutOrigin);
    }

    #[test]
    fn test_local_origin_remote_target_uploads_both() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("train.csv");
        std::fs::write(&origin, "a,b\n1,2\n").unwrap();

        let store = RecordingStore::default();
        let serializer = ArtifactSerializer::new(&store);
        let target = StorageLocation::parse("gs://bkt/out/").unwrap();
        let record = serializer
            .serialize(&target, &loader().with_origin(StorageLocation::Local(origin.clone())), "training")
            .unwrap();

        assert_eq!(record.artifact_location.to_string(), "gs://bkt/out/my_training_dataloader.pth");
        assert_eq!(record.origin_location.unwrap().to_string(), "gs://bkt/out/training_train.csv");

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!((uploads[0].0.as_str(), uploads[0].1.as_str()), ("bkt", "out/training_train.csv"));
        assert_eq!(uploads[0].2, origin);
        assert_eq!((uploads[1].0.as_str(), uploads[1].1.as_str()), ("bkt", "out/my_training_dataloader.pth"));

        // temp file for the loader is gone after upload
        assert!(!uploads[1].2.exists());
        let name = uploads[1].2.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("my_training_dataloader"));
    }

    #[test]
    fn test_local_target_writes_directly() {
        let temp = TempDir::new().unwrap();
        let store = RecordingStore::default();
        let serializer = ArtifactSerializer::new(&store);
        let target = StorageLocation::Local(temp.path().join("artifacts"));
        let origin = StorageLocation::local("/data/test.csv").unwrap();

        let record = serializer.serialize(&target, &loader().with_origin(origin.clone()), "testing").unwrap();

        let expected = temp.path().join("artifacts").join("my_testing_dataloader.pth");
        assert_eq!(record.artifact_location, StorageLocation::Local(expected.clone()));
        assert_eq!(record.origin_location, Some(origin));
        assert!(expected.is_file());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_origin_is_left_untouched() {
        let store = RecordingStore::default();
        let serializer = ArtifactSerializer::new(&store);
        let origin = StorageLocation::parse("gs://datasets/mnist/train").unwrap();

        let record = serializer
            .serialize(&StorageLocation::remote("bkt", ""), &loader().with_origin(origin.clone()), "training")
            .unwrap();

        assert_eq!(record.origin_location, Some(origin));
        assert_eq!(record.artifact_location.to_string(), "gs://bkt/my_training_dataloader.pth");

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, "my_training_dataloader.pth");
        let stored: DataLoader = serde_json::from_slice(&uploads[0].3).unwrap();
        assert_eq!(stored.origin, record.origin_location);
    }

    #[test]
    fn test_remote_origin_local_target_writes_locally() {
        let temp = TempDir::new().unwrap();
        let store = RecordingStore::default();
        let serializer = ArtifactSerializer::new(&store);
        let origin = StorageLocation::remote("datasets", "train.csv");

        let record = serializer
            .serialize(&StorageLocation::Local(temp.path().to_path_buf()), &loader().with_origin(origin.clone()), "training")
            .unwrap();

        assert_eq!(record.origin_location, Some(origin));
        assert!(temp.path().join("my_training_dataloader.pth").is_file());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_origin_remote_target() {
        let store = RecordingStore::default();
        let serializer = ArtifactSerializer::new(&store);

        let record = serializer.serialize(&StorageLocation::remote("bkt", "runs/1"), &loader(), "testing").unwrap();

        assert_eq!(record.origin_location, None);
        assert_eq!(record.artifact_location.to_string(), "gs://bkt/runs/1/my_testing_dataloader.pth");
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_upload_propagates_and_cleans_temp_file() {
        let store = RecordingStore { fail: true, ..Default::default() };
        let serializer = ArtifactSerializer::new(&store);

        let err = serializer.serialize(&StorageLocation::remote("bkt", "out"), &loader(), "training").unwrap_err();

        assert!(matches!(err, StorageError::Store(StoreError::Status { status: 500, .. })));
        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(!uploads[0].2.exists());
    }
}
