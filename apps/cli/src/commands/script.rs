//! Script commands: `synthesize`, `registry`.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use relay_codegen::{extract_class_source, ClassDescriptor, PyLiteral, ScriptRequest, ScriptSynthesizer, SerializationRegistry};
use std::path::PathBuf;

pub struct SynthesizeOptions {
    pub descriptor: PathBuf,
    pub method: String,
    pub params: Vec<String>,
    pub args: Vec<String>,
    pub ctor_args: Vec<String>,
    pub ctor_kwargs: Vec<String>,
    pub output: Option<PathBuf>,
}

pub fn synthesize(registry: &SerializationRegistry, options: SynthesizeOptions) -> Result<()> {
    let descriptor = ClassDescriptor::from_json_file(&options.descriptor)
        .with_context(|| format!("Failed to read class descriptor {}", options.descriptor.display()))?;
    let class_source = extract_class_source(&descriptor)?;

    let mut request = ScriptRequest::new(descriptor.name.clone(), options.method);
    for raw in &options.ctor_args {
        request = request.constructor_arg(parse_literal(raw));
    }
    for raw in &options.ctor_kwargs {
        let (name, value) = split_assignment(raw)?;
        request = request.constructor_kwarg(name, parse_literal(value));
    }
    for raw in &options.params {
        let (name, type_tag, location) = parse_serialized_param(raw)?;
        request = request.serialized(name, location, type_tag);
    }
    for raw in &options.args {
        let (name, value) = split_assignment(raw)?;
        request = request.pass_through(name, parse_literal(value));
    }

    let script = ScriptSynthesizer::new(registry).synthesize(&class_source, &request)?;

    match options.output {
        Some(path) => {
            script.write_to(&path)?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => print!("{script}"),
    }
    Ok(())
}

pub fn list_registry(registry: &SerializationRegistry, json_output: bool) -> Result<()> {
    if json_output {
        let entries: Vec<_> = registry.entries().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<32} {:<24} {}", "Type tag", "Serializer", "Deserializer");
    println!("{}", "─".repeat(84));
    for entry in registry.entries() {
        println!("{:<32} {:<24} {}", entry.type_tag.cyan(), entry.serializer, entry.deserializer);
    }
    Ok(())
}

/// `name=value`
fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("expected NAME=VALUE, got '{raw}'"),
    }
}

/// `name:type_tag=location`
fn parse_serialized_param(raw: &str) -> Result<(&str, &str, &str)> {
    let (lhs, location) = split_assignment(raw)?;
    match lhs.split_once(':') {
        Some((name, type_tag)) if !name.is_empty() && !type_tag.is_empty() && !location.is_empty() => {
            Ok((name, type_tag, location))
        }
        _ => bail!("expected NAME:TYPE_TAG=LOCATION, got '{raw}'"),
    }
}

/// JSON when it parses, otherwise the raw text as a string.
fn parse_literal(raw: &str) -> PyLiteral {
    serde_json::from_str::<serde_json::Value>(raw).map_or_else(|_| PyLiteral::from(raw), PyLiteral::from)
}
