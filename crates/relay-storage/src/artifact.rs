use crate::error::StorageResult;
use crate::location::StorageLocation;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// File extension used for serialized loaders, kept for compatibility with the
/// remote runner's naming.
pub const ARTIFACT_EXTENSION: &str = "pth";

/// Records a data loader iterates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub name: Option<String>,
    pub records: Vec<serde_json::Value>,
}

impl Dataset {
    #[must_use]
    pub fn new(records: Vec<serde_json::Value>) -> Self {
        Self { name: None, records }
    }

    #[must_use]
    pub fn named(name: impl Into<String>, records: Vec<serde_json::Value>) -> Self {
        Self { name: Some(name.into()), records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Iteration settings. Opaque to the storage strategies; carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub batch_size: usize,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub drop_last: bool,
    #[serde(default)]
    pub num_workers: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 1, shuffle: false, drop_last: false, num_workers: 0, seed: None }
    }
}

/// In-memory data loader artifact: a dataset, how to iterate it, and optionally
/// where the dataset was originally read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLoader {
    pub dataset: Dataset,
    #[serde(default)]
    pub config: LoaderConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<StorageLocation>,
}

impl DataLoader {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset, config: LoaderConfig::default(), origin: None }
    }

    #[must_use]
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: StorageLocation) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Number of batches one pass over the dataset yields.
    #[must_use]
    pub fn num_batches(&self) -> usize {
        let batch = self.config.batch_size.max(1);
        let len = self.dataset.len();
        if self.config.drop_last {
            len / batch
        } else {
            len.div_ceil(batch)
        }
    }

    pub fn write_to(&self, writer: impl Write) -> StorageResult<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> StorageResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Temp-file tag for a role, e.g. `my_training_dataloader`.
#[must_use]
pub fn artifact_tag(role: &str) -> String {
    format!("my_{role}_dataloader")
}

/// Stored file name for a role, e.g. `my_training_dataloader.pth`.
#[must_use]
pub fn artifact_file_name(role: &str) -> String {
    format!("{}.{ARTIFACT_EXTENSION}", artifact_tag(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_loader() -> DataLoader {
        DataLoader::new(Dataset::named("iris", vec![json!({"x": 1}), json!({"x": 2}), json!({"x": 3})]))
            .with_config(LoaderConfig { batch_size: 2, shuffle: true, ..Default::default() })
    }

    #[test]
    fn test_artifact_naming() {
        assert_eq!(artifact_tag("testing"), "my_testing_dataloader");
        assert_eq!(artifact_file_name("training"), "my_training_dataloader.pth");
    }

    #[test]
    fn test_num_batches() {
        let mut loader = sample_loader();
        assert_eq!(loader.num_batches(), 2);

        loader.config.drop_last = true;
        assert_eq!(loader.num_batches(), 1);
    }

    #[test]
    fn test_save_and_load_preserves_origin() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("loader.pth");
        let loader = sample_loader().with_origin(StorageLocation::local("/data/train.csv").unwrap());

        loader.save(&path).unwrap();
        let loaded = DataLoader::load(&path).unwrap();

        assert_eq!(loaded, loader);
    }

    #[test]
    fn test_load_defaults_missing_fields() {
        let loader: DataLoader = serde_json::from_str(r#"{"dataset": {"records": [1, 2]}}"#).unwrap();
        assert_eq!(loader.config, LoaderConfig::default());
        assert!(loader.origin.is_none());
        assert_eq!(loader.dataset.len(), 2);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.pth");
        std::fs::write(&path, b"\x80not json").unwrap();
        assert!(DataLoader::load(&path).is_err());
    }
}
