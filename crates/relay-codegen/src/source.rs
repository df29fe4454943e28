//! Class source assembly.
//!
//! The host framework describes a live model object as a [`ClassDescriptor`]: its
//! class name plus the members it exposes, each classified and carrying its source
//! text. Anything implementing [`Inspectable`] can be turned into a standalone class
//! definition, regardless of which concrete user class it came from.

use crate::error::{CodegenError, CodegenResult};
use crate::literal::validate_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Function,
    /// Non-callable attribute; never emitted.
    Attribute,
}

impl MemberKind {
    #[must_use]
    pub fn is_callable(self) -> bool {
        matches!(self, Self::Method | Self::Function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub source: String,
}

impl Member {
    #[must_use]
    pub fn method(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self { name: name.into(), kind: MemberKind::Method, source: source.into() }
    }

    #[must_use]
    pub fn function(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self { name: name.into(), kind: MemberKind::Function, source: source.into() }
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: MemberKind::Attribute, source: String::new() }
    }
}

/// Anything that can report its class name and enumerate its members with source.
pub trait Inspectable {
    fn class_name(&self) -> &str;

    /// Members in the order they should appear in the generated class.
    fn members(&self) -> Vec<Member>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl ClassDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: Vec::new() }
    }

    #[must_use]
    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn from_json_file(path: &Path) -> CodegenResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Inspectable for ClassDescriptor {
    fn class_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> Vec<Member> {
        self.members.clone()
    }
}

/// Generated `class <Name>:` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSource {
    class_name: String,
    text: String,
}

impl ClassSource {
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ClassSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Collect every callable member of `instance` beneath a single class header.
pub fn extract_class_source(instance: &impl Inspectable) -> CodegenResult<ClassSource> {
    let class_name = instance.class_name();
    validate_identifier(class_name)?;

    let mut lines = vec![format!("class {class_name}:")];
    let mut emitted = 0usize;

    for member in instance.members() {
        if !member.kind.is_callable() {
            debug!(class = class_name, member = %member.name, "skipping non-callable member");
            continue;
        }
        if member.source.trim().is_empty() {
            return Err(CodegenError::MissingMemberSource {
                class_name: class_name.to_string(),
                member: member.name,
            });
        }
        if emitted > 0 {
            lines.push(String::new());
        }
        lines.extend(reindent(&member.source));
        emitted += 1;
    }

    if emitted == 0 {
        lines.push(format!("{INDENT}pass"));
    }
    debug!(class = class_name, methods = emitted, "assembled class source");

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(ClassSource { class_name: class_name.to_string(), text })
}

/// Strip the common leading indentation and indent one level under the class header.
fn reindent(source: &str) -> Vec<String> {
    let body: Vec<&str> = source.trim_matches('\n').lines().collect();
    let common = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                let stripped = line.get(common..).unwrap_or_else(|| line.trim_start());
                format!("{INDENT}{}", stripped.trim_end())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodegenError;

    #[test]
    fn test_extracts_callables_in_order() {
        let descriptor = ClassDescriptor::new("MyModel")
            .with_member(Member::method("__init__", "    def __init__(self, lr):\n        self.lr = lr\n"))
            .with_member(Member::attribute("lr"))
            .with_member(Member::method("fit", "def fit(self, data):\n    return data\n"));

        let source = extract_class_source(&descriptor).unwrap();
        assert_eq!(source.class_name(), "MyModel");
        assert_eq!(
            source.as_str(),
            "class MyModel:\n    def __init__(self, lr):\n        self.lr = lr\n\n    def fit(self, data):\n        return data\n"
        );
    }

    #[test]
    fn test_keeps_decorators_and_blank_lines() {
        let descriptor = ClassDescriptor::new("Net").with_member(Member::function(
            "helper",
            "    @staticmethod\n    def helper(x):\n\n        return x * 2",
        ));

        let source = extract_class_source(&descriptor).unwrap();
        assert_eq!(
            source.as_str(),
            "class Net:\n    @staticmethod\n    def helper(x):\n\n        return x * 2\n"
        );
    }

    #[test]
    fn test_no_callables_yields_pass() {
        let descriptor = ClassDescriptor::new("Empty").with_member(Member::attribute("x"));
        let source = extract_class_source(&descriptor).unwrap();
        assert_eq!(source.as_str(), "class Empty:\n    pass\n");
    }

    #[test]
    fn test_rejects_callable_without_source() {
        let err = extract_class_source(&ClassDescriptor::new("M").with_member(Member::method("fit", ""))).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::MissingMemberSource { ref class_name, ref member } if class_name == "M" && member == "fit"
        ));

        let json = r#"{"name": "M", "members": [{"name": "fit", "kind": "function", "source": "  \n  "}]}"#;
        let descriptor: ClassDescriptor = serde_json::from_str(json).unwrap();
        assert!(matches!(extract_class_source(&descriptor), Err(CodegenError::MissingMemberSource { .. })));

        let json = r#"{"name": "M", "members": [{"name": "fit", "kind": "method"}]}"#;
        let descriptor: ClassDescriptor = serde_json::from_str(json).unwrap();
        assert!(matches!(extract_class_source(&descriptor), Err(CodegenError::MissingMemberSource { .. })));
    }

    #[test]
    fn test_rejects_invalid_class_name() {
        let err = extract_class_source(&ClassDescriptor::new("not a name")).unwrap_err();
        assert!(matches!(err, CodegenError::InvalidIdentifier(_)));
    }

    /// Inspection only depends on the trait, not on the descriptor type.
    struct GeneratedModel;

    impl Inspectable for GeneratedModel {
        fn class_name(&self) -> &str {
            "Generated"
        }

        fn members(&self) -> Vec<Member> {
            vec![Member::method("run", "def run(self):\n    print('hi')")]
        }
    }

    #[test]
    fn test_custom_inspectable() {
        let source = extract_class_source(&GeneratedModel).unwrap();
        assert_eq!(source.as_str(), "class Generated:\n    def run(self):\n        print('hi')\n");
    }

    #[test]
    fn test_descriptor_json() {
        let json = r#"{
            "name": "Regressor",
            "members": [
                {"name": "train", "kind": "method", "source": "def train(self):\n    pass"},
                {"name": "coef", "kind": "attribute"}
            ]
        }"#;
        let descriptor: ClassDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.members.len(), 2);
        assert_eq!(descriptor.members[1].kind, MemberKind::Attribute);
    }
}
