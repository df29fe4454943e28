use thiserror::Error;

pub type CodegenResult<T> = std::result::Result<T, CodegenError>;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("no serializer registered for type tag '{0}'")]
    UnknownTypeTag(String),

    #[error("registry entries need a non-empty type tag")]
    EmptyTypeTag,

    #[error("type tag '{0}' is already registered")]
    DuplicateTypeTag(String),

    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("member '{class_name}.{member}' is callable but has no source text")]
    MissingMemberSource { class_name: String, member: String },

    #[error("parameter '{0}' is given more than once")]
    DuplicateParameter(String),

    #[error("class source is for '{found}' but the script instantiates '{expected}'")]
    ClassMismatch { expected: String, found: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
