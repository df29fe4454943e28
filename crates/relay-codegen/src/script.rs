//! Entry-point script synthesis.
//!
//! A synthesized script is three blocks of text: a fixed import preamble, the class
//! source, and a `__main__` block that instantiates the class and calls one method.
//! Serialized parameters are rehydrated in the call by their registered deserializer.

use crate::error::{CodegenError, CodegenResult};
use crate::literal::{validate_identifier, PyLiteral};
use crate::registry::SerializationRegistry;
use crate::source::ClassSource;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_PREAMBLE: &[&str] = &[
    "import torch",
    "import pandas as pd",
    "from google.cloud.aiplatform import training_util",
    "from google.cloud.aiplatform.experimental.vertex_model.serializers import *",
];

/// Local name the instance is bound to inside the entry block.
pub const INSTANCE_NAME: &str = "model";

const INDENT: &str = "    ";

/// A method argument stored at `location`, rehydrated with the deserializer
/// registered for `type_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedParam {
    pub location: String,
    pub type_tag: String,
}

/// Everything the entry block needs. Map order is the order arguments are emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptRequest {
    pub class_name: String,
    pub method_name: String,
    pub constructor_args: Vec<PyLiteral>,
    pub constructor_kwargs: IndexMap<String, PyLiteral>,
    pub serialized_params: IndexMap<String, SerializedParam>,
    pub pass_through_params: IndexMap<String, PyLiteral>,
}

impl ScriptRequest {
    #[must_use]
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self { class_name: class_name.into(), method_name: method_name.into(), ..Default::default() }
    }

    #[must_use]
    pub fn constructor_arg(mut self, value: impl Into<PyLiteral>) -> Self {
        self.constructor_args.push(value.into());
        self
    }

    #[must_use]
    pub fn constructor_kwarg(mut self, name: impl Into<String>, value: impl Into<PyLiteral>) -> Self {
        self.constructor_kwargs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn serialized(
        mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Self {
        self.serialized_params
            .insert(name.into(), SerializedParam { location: location.into(), type_tag: type_tag.into() });
        self
    }

    #[must_use]
    pub fn pass_through(mut self, name: impl Into<String>, value: impl Into<PyLiteral>) -> Self {
        self.pass_through_params.insert(name.into(), value.into());
        self
    }

    fn validate(&self) -> CodegenResult<()> {
        validate_identifier(&self.class_name)?;
        validate_identifier(&self.method_name)?;
        for name in self.constructor_kwargs.keys() {
            validate_identifier(name)?;
        }

        let mut seen = HashSet::new();
        for name in self.serialized_params.keys().chain(self.pass_through_params.keys()) {
            validate_identifier(name)?;
            if !seen.insert(name.as_str()) {
                return Err(CodegenError::DuplicateParameter(name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedScript {
    text: String,
}

impl SynthesizedScript {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    pub fn write_to(&self, path: &Path) -> CodegenResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.text)?;
        Ok(())
    }
}

impl fmt::Display for SynthesizedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub struct ScriptSynthesizer<'r> {
    registry: &'r SerializationRegistry,
    preamble: Vec<String>,
}

impl<'r> ScriptSynthesizer<'r> {
    #[must_use]
    pub fn new(registry: &'r SerializationRegistry) -> Self {
        Self { registry, preamble: DEFAULT_PREAMBLE.iter().map(|line| (*line).to_string()).collect() }
    }

    #[must_use]
    pub fn with_preamble(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.preamble = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Render the script. Identical inputs and registry always give identical text.
    pub fn synthesize(&self, class_source: &ClassSource, request: &ScriptRequest) -> CodegenResult<SynthesizedScript> {
        request.validate()?;
        if class_source.class_name() != request.class_name {
            return Err(CodegenError::ClassMismatch {
                expected: request.class_name.clone(),
                found: class_source.class_name().to_string(),
            });
        }

        // Resolve every deserializer before emitting anything.
        let deserializers = request
            .serialized_params
            .values()
            .map(|param| self.registry.deserializer_for(&param.type_tag))
            .collect::<CodegenResult<Vec<_>>>()?;

        let mut text = String::new();
        for line in &self.preamble {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(class_source.as_str());
        if !text.ends_with('\n') {
            text.push('\n');
        }

        text.push_str("\nif __name__ == '__main__':\n");
        let _ = writeln!(
            text,
            "{INDENT}{INSTANCE_NAME} = {}({})",
            request.class_name,
            constructor_call_args(request)
        );
        let _ = writeln!(text, "{INDENT}{INSTANCE_NAME}.{}(", request.method_name);
        for ((name, param), deserializer) in request.serialized_params.iter().zip(deserializers) {
            let location = PyLiteral::Str(param.location.clone());
            let _ = writeln!(text, "{INDENT}{INDENT}{name}={deserializer}({location}),");
        }
        for (name, value) in &request.pass_through_params {
            let _ = writeln!(text, "{INDENT}{INDENT}{name}={value},");
        }
        let _ = writeln!(text, "{INDENT})");

        debug!(
            class = %request.class_name,
            method = %request.method_name,
            serialized = request.serialized_params.len(),
            pass_through = request.pass_through_params.len(),
            "synthesized entry-point script"
        );
        Ok(SynthesizedScript { text })
    }
}

fn constructor_call_args(request: &ScriptRequest) -> String {
    request
        .constructor_args
        .iter()
        .map(ToString::to_string)
        .chain(request.constructor_kwargs.iter().map(|(name, value)| format!("{name}={value}")))
        .collect::<Vec<_>>()
        .join(", ")
}
