//! Storage location parsing.
//!
//! A location string is either a `gs://<bucket>/<prefix...>` object-store URI or a
//! plain filesystem path. The `gs://` prefix is the only discriminator.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Scheme marker for remote (object store) locations.
pub const REMOTE_SCHEME: &str = "gs://";

/// Where an artifact or its origin data lives.
///
/// The string form of `Remote` always starts with [`REMOTE_SCHEME`]; locations built
/// through [`StorageLocation::parse`] never produce a `Local` path that does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StorageLocation {
    /// Build through [`StorageLocation::parse`] or [`StorageLocation::local`], which
    /// keep remote-looking paths out of this variant.
    Local(PathBuf),
    Remote { bucket: String, prefix: String },
}

impl StorageLocation {
    /// Parse a location string. No existence check is made for local paths.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let Some(rest) = raw.strip_prefix(REMOTE_SCHEME) else {
            return Ok(Self::Local(PathBuf::from(raw)));
        };

        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(StorageError::InvalidLocation(format!("missing bucket name in '{raw}'")));
        }

        Ok(Self::Remote {
            bucket: bucket.to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn remote(bucket: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        Self::Remote {
            bucket: bucket.into(),
            prefix: prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Local location for `path`. A path spelled with the remote scheme is rejected,
    /// since its string form would parse back as `Remote`.
    pub fn local(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if path.to_string_lossy().starts_with(REMOTE_SCHEME) {
            return Err(StorageError::InvalidLocation(format!(
                "'{}' is a remote location, not a local path",
                path.display()
            )));
        }
        Ok(Self::Local(path))
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    #[must_use]
    pub fn as_local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote { .. } => None,
        }
    }

    /// Child location named `name` directly beneath this one.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        match self {
            Self::Local(path) => Self::Local(path.join(name)),
            Self::Remote { bucket, prefix } => Self::Remote {
                bucket: bucket.clone(),
                prefix: join_blob_path(prefix, name),
            },
        }
    }

    /// Last path segment, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Local(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            Self::Remote { prefix, .. } => prefix
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        }
    }
}

/// Join an object prefix and a name with `/`, skipping the separator for an empty prefix.
pub(crate) fn join_blob_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote { bucket, prefix } if prefix.is_empty() => {
                write!(f, "{REMOTE_SCHEME}{bucket}")
            }
            Self::Remote { bucket, prefix } => write!(f, "{REMOTE_SCHEME}{bucket}/{prefix}"),
        }
    }
}

impl FromStr for StorageLocation {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StorageLocation {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StorageLocation> for String {
    fn from(location: StorageLocation) -> Self {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_location() {
        let location = StorageLocation::parse("gs://bucket/a/b").unwrap();
        assert_eq!(location, StorageLocation::Remote { bucket: "bucket".to_string(), prefix: "a/b".to_string() });
        assert!(location.is_remote());
    }

    #[test]
    fn test_parse_remote_strips_trailing_slash() {
        let location = StorageLocation::parse("gs://bkt/out/").unwrap();
        assert_eq!(location, StorageLocation::remote("bkt", "out"));
        assert_eq!(location.to_string(), "gs://bkt/out");
    }

    #[test]
    fn test_parse_bucket_only() {
        let location = StorageLocation::parse("gs://bkt").unwrap();
        assert_eq!(location, StorageLocation::remote("bkt", ""));
        assert_eq!(location.to_string(), "gs://bkt");
        assert_eq!(location.file_name(), None);
    }

    #[test]
    fn test_parse_local_location() {
        let location = StorageLocation::parse("/tmp/x").unwrap();
        assert_eq!(location, StorageLocation::Local(PathBuf::from("/tmp/x")));
        assert!(!location.is_remote());
        assert_eq!(location.to_string(), "/tmp/x");
    }

    #[test]
    fn test_parse_rejects_empty_bucket() {
        let err = StorageLocation::parse("gs:///prefix").unwrap_err();
        assert!(matches!(err, StorageError::InvalidLocation(_)));
        assert!(err.to_string().contains("gs:///prefix"));

        assert!(StorageLocation::parse("gs://").is_err());
    }

    #[test]
    fn test_other_schemes_are_local() {
        let location = StorageLocation::parse("s3://bucket/key").unwrap();
        assert!(matches!(location, StorageLocation::Local(_)));
    }

    #[test]
    fn test_local_rejects_remote_scheme() {
        let err = StorageLocation::local("gs://bkt/data.csv").unwrap_err();
        assert!(matches!(err, StorageError::InvalidLocation(_)));

        let location = StorageLocation::local("/data/gs://odd").unwrap();
        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(serde_json::from_str::<StorageLocation>(&json).unwrap(), location);
    }

    #[test]
    fn test_join() {
        let remote = StorageLocation::remote("bkt", "out");
        assert_eq!(remote.join("file.pth").to_string(), "gs://bkt/out/file.pth");

        let bare = StorageLocation::remote("bkt", "");
        assert_eq!(bare.join("file.pth").to_string(), "gs://bkt/file.pth");

        let local = StorageLocation::local("/data/out/").unwrap();
        assert_eq!(local.join("file.pth"), StorageLocation::local("/data/out/file.pth").unwrap());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(StorageLocation::local("/data/train.csv").unwrap().file_name().as_deref(), Some("train.csv"));
        assert_eq!(StorageLocation::remote("bkt", "a/b.csv").file_name().as_deref(), Some("b.csv"));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let location = StorageLocation::remote("bkt", "a/b");
        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(json, "\"gs://bkt/a/b\"");

        let back: StorageLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, location);

        assert!(serde_json::from_str::<StorageLocation>("\"gs:///nope\"").is_err());
    }
}
