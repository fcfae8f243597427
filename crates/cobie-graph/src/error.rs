//! Error types for the repository, the change tracker and alignment runs.

use thiserror::Error;

use cobie_core::{CoreError, ElementId};
use cobie_schema::SchemaError;
use cobie_source::SourceError;

/// Repository failures.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Code already in use: {0}")]
    DuplicateCode(String),

    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Element has no id: {0}")]
    MissingId(String),

    #[error("Graph backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("Element serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Change tracker failures.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("State database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("State migration error: {0}")]
    Migration(String),

    #[error("State connection lock poisoned")]
    Poisoned,
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Any failure that aborts a synchronization run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{kind} '{name}' has not been resolved")]
    Lookup { kind: &'static str, name: String },

    #[error("Bad data in {table} row {row}: {reason}")]
    Data {
        table: String,
        row: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl SyncError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn lookup(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Lookup {
            kind,
            name: name.into(),
        }
    }

    pub fn data(table: &str, row: &str, reason: impl Into<String>) -> Self {
        Self::Data {
            table: table.to_string(),
            row: row.to_string(),
            reason: reason.into(),
        }
    }
}
