//! Schema synthesis errors.

use thiserror::Error;

use cobie_source::SourceError;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Class '{class}' derives from '{base_class}', which is neither referenced nor a registered template")]
    MissingTemplate { class: String, base_class: String },

    #[error("Relationship '{relationship}' constrains on class '{class}', which was not synthesized")]
    MissingConstraintClass { relationship: String, class: String },

    #[error("Invalid schema document: {0}")]
    InvalidDocument(String),

    #[error("Schema document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
