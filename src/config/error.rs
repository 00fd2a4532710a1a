use thiserror::Error;

use super::ValueKind;

/// Faults raised by the property store and its collaborators.
///
/// These surface from accessor calls unchanged; the proxy layer never
/// retries or reinterprets them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("no value for property '{0}' and no default")]
    MissingProperty(String),

    #[error("failed to parse config source '{name}': {source}")]
    ParseError {
        name: String,
        source: toml::de::Error,
    },

    #[error("failed to deserialize config value: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("cannot decode '{literal}' as {kind}")]
    DecodeError { kind: ValueKind, literal: String },

    #[error("circular reference detected while resolving '{0}'")]
    CircularReference(String),

    #[error("referenced path not found: {0}")]
    ReferenceNotFound(String),

    #[error("invalid reference path: {0}")]
    InvalidReferencePath(String),

    #[error("cannot reference non-scalar value: {0}")]
    NonScalarReference(String),

    #[error("unclosed reference (missing '}}') in '{0}'")]
    UnclosedReference(String),

    #[error("unknown configuration source: {0}")]
    UnknownSource(String),
}
