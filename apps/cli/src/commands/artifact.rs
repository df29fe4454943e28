//! Artifact commands: `resolve`, `serialize`, `deserialize`.

use anyhow::{Context, Result};
use colored::Colorize;
use relay_storage::{ArtifactDeserializer, ArtifactSerializer, DataLoader, StorageConfig, StorageLocation};
use std::path::{Path, PathBuf};

pub fn resolve(location: &str, json_output: bool) -> Result<()> {
    let parsed = StorageLocation::parse(location)?;

    if json_output {
        let out = match &parsed {
            StorageLocation::Local(path) => serde_json::json!({ "kind": "local", "path": path }),
            StorageLocation::Remote { bucket, prefix } => {
                serde_json::json!({ "kind": "remote", "bucket": bucket, "prefix": prefix })
            }
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match parsed {
        StorageLocation::Local(path) => {
            println!("{}", "Local location".bold().cyan());
            println!("  path:   {}", path.display());
        }
        StorageLocation::Remote { bucket, prefix } => {
            println!("{}", "Remote location".bold().cyan());
            println!("  bucket: {}", bucket);
            println!("  prefix: {}", if prefix.is_empty() { "-".dimmed().to_string() } else { prefix });
        }
    }
    Ok(())
}

pub fn serialize(storage: &StorageConfig, target: &str, role: &str, input: &Path) -> Result<()> {
    let loader = DataLoader::load(input).with_context(|| format!("Failed to read data loader from {}", input.display()))?;
    let target = StorageLocation::parse(target)?;

    let store = storage.build_store()?;
    let record = ArtifactSerializer::new(store.as_ref())
        .serialize(&target, &loader, role)
        .with_context(|| format!("Failed to serialize {role} data loader to {target}"))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn deserialize(storage: &StorageConfig, location: &str, output: Option<PathBuf>) -> Result<()> {
    let store = storage.build_store()?;
    let loader = ArtifactDeserializer::new(store.as_ref()).deserialize_str(location)?;

    match output {
        Some(path) => {
            loader.save(&path).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} {} records, {} batches -> {}",
                "Restored".green(),
                loader.dataset.len(),
                loader.num_batches(),
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&loader)?),
    }
    Ok(())
}
