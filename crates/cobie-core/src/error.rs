//! Error types for configuration and value handling.

use thiserror::Error;

use crate::value::PrimitiveType;

/// Errors raised while resolving static configuration or coercing values.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Element class not registered: {0}")]
    UnknownClass(String),

    #[error("Relationship class not registered: {0}")]
    UnknownRelationship(String),

    #[error("Invalid element tree: {0}")]
    InvalidTree(String),

    #[error("Cannot read value {value} as {expected}")]
    ValueType { value: String, expected: PrimitiveType },

    #[error("Element tree parse error: {0}")]
    TreeParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an invalid tree error.
    pub fn invalid_tree(msg: impl Into<String>) -> Self {
        Self::InvalidTree(msg.into())
    }
}
