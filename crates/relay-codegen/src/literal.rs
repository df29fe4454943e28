//! Python literal rendering and identifier checks for generated scripts.

use crate::error::{CodegenError, CodegenResult};
use indexmap::IndexMap;
use std::fmt;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
    "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// A value that can be written into generated source as a Python literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PyLiteral {
    None,
    Bool(bool),
    /// Wide enough for every integer JSON input can carry.
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<PyLiteral>),
    Dict(IndexMap<String, PyLiteral>),
}

impl PyLiteral {
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PyLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => f.write_str("float('nan')"),
            Self::Float(v) if v.is_infinite() && *v > 0.0 => f.write_str("float('inf')"),
            Self::Float(v) if v.is_infinite() => f.write_str("-float('inf')"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(s) => write_quoted(f, s),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dict(entries) => {
                f.write_str("{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 || c as u32 == 0x7f => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

impl From<serde_json::Value> for PyLiteral {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Self::Int(i.into()),
                (None, Some(u)) => Self::Int(u.into()),
                (None, None) => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => Self::Dict(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<bool> for PyLiteral {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PyLiteral {
    fn from(value: i64) -> Self {
        Self::Int(value.into())
    }
}

impl From<u64> for PyLiteral {
    fn from(value: u64) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PyLiteral {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PyLiteral {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PyLiteral {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !PYTHON_KEYWORDS.contains(&name)
}

pub fn validate_identifier(name: &str) -> CodegenResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(CodegenError::InvalidIdentifier(name.to_string()))
    }
}
