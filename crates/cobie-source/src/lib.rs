//! # COBie Source
//!
//! Read-only access to the intermediary SQLite database produced from a COBie
//! workbook: table and column enumeration plus the joined, aliased row
//! projection the alignment engine consumes.

pub mod keys;
pub mod pool;
pub mod reader;

pub use keys::{primary_key_column, ForeignKey, JoinMap};
pub use pool::{SourceError, SourcePool, SourceResult};
pub use reader::{ColumnInfo, SourceReader, TableInfo};
