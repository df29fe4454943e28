use crate::error::{CodegenError, CodegenResult};
use crate::literal::validate_identifier;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Type tag for pandas data frames.
pub const DATAFRAME_TYPE_TAG: &str = "pandas.DataFrame";
/// Type tag for torch data loaders.
pub const DATALOADER_TYPE_TAG: &str = "torch.utils.data.DataLoader";

/// A registered serializer/deserializer pair.
///
/// The two functions are referenced by name from generated scripts and are
/// expected to be importable from the script's preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Logical data type, e.g. `pandas.DataFrame`
    pub type_tag: String,
    pub serializer: String,
    pub deserializer: String,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(type_tag: impl Into<String>, serializer: impl Into<String>, deserializer: impl Into<String>) -> Self {
        Self { type_tag: type_tag.into(), serializer: serializer.into(), deserializer: deserializer.into() }
    }

    fn validate(&self) -> CodegenResult<()> {
        if self.type_tag.trim().is_empty() {
            return Err(CodegenError::EmptyTypeTag);
        }
        validate_identifier(&self.serializer)?;
        validate_identifier(&self.deserializer)?;
        Ok(())
    }
}

/// Read-only mapping from type tag to its serializer pair.
///
/// Built once with [`RegistryBuilder`] and then shared by reference; there is no
/// way to mutate a built registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializationRegistry {
    entries: IndexMap<String, RegistryEntry>,
}

impl SerializationRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with the data frame and data loader pairs the remote runner ships with.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self { entries: default_entries().into_iter().map(|e| (e.type_tag.clone(), e)).collect() }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> CodegenResult<Self> {
        entries
            .into_iter()
            .try_fold(Self::builder(), RegistryBuilder::register)
            .map(RegistryBuilder::build)
    }

    #[must_use]
    pub fn get(&self, type_tag: &str) -> Option<&RegistryEntry> {
        self.entries.get(type_tag)
    }

    pub fn deserializer_for(&self, type_tag: &str) -> CodegenResult<&str> {
        self.get(type_tag)
            .map(|e| e.deserializer.as_str())
            .ok_or_else(|| CodegenError::UnknownTypeTag(type_tag.to_string()))
    }

    pub fn serializer_for(&self, type_tag: &str) -> CodegenResult<&str> {
        self.get(type_tag)
            .map(|e| e.serializer.as_str())
            .ok_or_else(|| CodegenError::UnknownTypeTag(type_tag.to_string()))
    }

    #[must_use]
    pub fn contains(&self, type_tag: &str) -> bool {
        self.entries.contains_key(type_tag)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: IndexMap<String, RegistryEntry>,
}

impl RegistryBuilder {
    /// Add an entry; each type tag may only be registered once.
    pub fn register(mut self, entry: RegistryEntry) -> CodegenResult<Self> {
        entry.validate()?;
        if self.entries.contains_key(&entry.type_tag) {
            return Err(CodegenError::DuplicateTypeTag(entry.type_tag));
        }
        self.entries.insert(entry.type_tag.clone(), entry);
        Ok(self)
    }

    pub fn with_defaults(self) -> CodegenResult<Self> {
        default_entries().into_iter().try_fold(self, Self::register)
    }

    #[must_use]
    pub fn build(self) -> SerializationRegistry {
        SerializationRegistry { entries: self.entries }
    }
}

fn default_entries() -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::new(DATAFRAME_TYPE_TAG, "_serialize_dataframe", "_deserialize_dataframe"),
        RegistryEntry::new(DATALOADER_TYPE_TAG, "_serialize_dataloader", "_deserialize_dataloader"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = SerializationRegistry::with_defaults();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.deserializer_for(DATALOADER_TYPE_TAG).unwrap(), "_deserialize_dataloader");
        assert_eq!(registry.serializer_for(DATAFRAME_TYPE_TAG).unwrap(), "_serialize_dataframe");
    }

    #[test]
    fn test_unknown_tag() {
        let registry = SerializationRegistry::with_defaults();
        let err = registry.deserializer_for("numpy.ndarray").unwrap_err();
        assert!(matches!(err, CodegenError::UnknownTypeTag(ref tag) if tag == "numpy.ndarray"));
        assert!(err.to_string().contains("numpy.ndarray"));
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let err = SerializationRegistry::builder()
            .with_defaults()
            .unwrap()
            .register(RegistryEntry::new(DATAFRAME_TYPE_TAG, "a", "b"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::DuplicateTypeTag(_)));
    }

    #[test]
    fn test_function_names_must_be_identifiers() {
        let err = SerializationRegistry::from_entries([RegistryEntry::new("x", "ok", "not ok")]).unwrap_err();
        assert!(matches!(err, CodegenError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_from_entries_preserves_order() {
        let registry = SerializationRegistry::from_entries([
            RegistryEntry::new("b", "ser_b", "de_b"),
            RegistryEntry::new("a", "ser_a", "de_a"),
        ])
        .unwrap();
        let tags: Vec<_> = registry.entries().map(|e| e.type_tag.as_str()).collect();
        assert_eq!(tags, vec!["b", "a"]);
    }

    #[test]
    fn test_builder_defaults_match_with_defaults() {
        let built = SerializationRegistry::builder().with_defaults().unwrap().build();
        assert_eq!(built, SerializationRegistry::with_defaults());
    }
}
