//! Relay Storage
//!
//! Durable storage for data loader artifacts:
//! - Parsing `gs://` vs local locations (`StorageLocation`)
//! - Object store adapters (`ObjectStore`, GCS and filesystem backed)
//! - Choosing where a loader and its origin data go (`ArtifactSerializer`)
//! - Loading them back (`ArtifactDeserializer`)

pub mod artifact;
pub mod config;
pub mod deserializer;
pub mod error;
pub mod gcs;
pub mod location;
pub mod serializer;
pub mod store;

pub use artifact::{artifact_file_name, artifact_tag, DataLoader, Dataset, LoaderConfig, ARTIFACT_EXTENSION};
pub use config::StorageConfig;
pub use deserializer::ArtifactDeserializer;
pub use error::{StorageError, StorageResult, StoreError};
pub use gcs::{GcsObjectStore, DEFAULT_GCS_ENDPOINT};
pub use location::{StorageLocation, REMOTE_SCHEME};
pub use serializer::{ArtifactSerializer, SerializeStrategy, SerializedArtifactRecord};
pub use store::{FsObjectStore, ObjectStore};
