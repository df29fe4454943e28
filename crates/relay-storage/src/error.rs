use thiserror::Error;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage location: {0}")]
    InvalidLocation(String),

    /// The artifact bytes were fetched but could not be turned back into a loader.
    #[error("there was a problem reading the artifact at '{location}': {message}")]
    ArtifactLoad { location: String, message: String },

    #[error("storage config error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures raised by an `ObjectStore` implementation.
///
/// These are environment failures; callers above the adapter pass them through untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: gs://{bucket}/{path}")]
    NotFound { bucket: String, path: String },

    #[error("object store returned {status} for gs://{bucket}/{path}: {body}")]
    Status {
        status: u16,
        bucket: String,
        path: String,
        body: String,
    },

    #[error("object store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
