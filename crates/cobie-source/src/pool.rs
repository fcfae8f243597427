//! SQLite connection handling for the intermediary database.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Source database error types.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source database not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source database error: {0}")]
    Connection(#[from] rusqlite::Error),

    #[error("Source table not found: {0}")]
    UnknownTable(String),

    #[error("Join map entry {table}.{column} refers to missing table '{referenced}'")]
    MissingJoinTable {
        table: String,
        column: String,
        referenced: String,
    },

    #[error("Table '{table}' has no primary key column '{column}'")]
    MissingPrimaryKey { table: String, column: String },

    #[error("Source connection lock poisoned")]
    Poisoned,
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// A single guarded connection to the source database.
pub struct SourcePool {
    conn: Mutex<Connection>,
}

impl SourcePool {
    /// Open an existing database file read-only.
    pub fn open(path: &Path) -> SourceResult<Self> {
        if !path.is_file() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    /// In-memory database, mostly for fixtures.
    pub fn in_memory() -> SourceResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run a closure against the connection.
    pub fn with_conn<T, F>(&self, f: F) -> SourceResult<T>
    where
        F: FnOnce(&Connection) -> SourceResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| SourceError::Poisoned)?;
        f(&conn)
    }
}
