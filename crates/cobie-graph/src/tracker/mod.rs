//! Change tracking: which source items were synchronized, to which element,
//! with which content hash.

pub mod migrations;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use cobie_core::{ElementId, ItemState};

use crate::error::{TrackerError, TrackerResult};

/// One source item as seen in the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Model (or root subject) the item's element lives in.
    pub scope: ElementId,
    pub table: String,
    /// Table name plus primary-key value.
    pub identity: String,
    /// SHA-256 of the item's canonical content.
    pub checksum: String,
}

impl SourceItem {
    pub fn new(scope: ElementId, table: &str, identity: &str, checksum: impl Into<String>) -> Self {
        Self {
            scope,
            table: table.to_string(),
            identity: identity.to_string(),
            checksum: checksum.into(),
        }
    }
}

/// Classification of a source item plus the element it was last written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeResult {
    pub state: ItemState,
    pub element_id: Option<ElementId>,
}

pub trait ChangeTracker: Send + Sync {
    /// New if never recorded, Changed if the checksum differs, else Unchanged.
    fn detect_changes(&self, item: &SourceItem) -> TrackerResult<ChangeResult>;

    /// Store the item's checksum and element after a write.
    fn record(&self, run_id: &str, item: &SourceItem, element_id: ElementId) -> TrackerResult<()>;

    /// Note that an unchanged item was present in this run.
    fn mark_seen(&self, run_id: &str, item: &SourceItem) -> TrackerResult<()>;

    /// Identities recorded under `(scope, table)` that this run has not seen.
    fn unseen(&self, run_id: &str, scope: ElementId, table: &str) -> TrackerResult<Vec<String>>;
}

/// SQLite-backed tracker.
pub struct SqliteChangeTracker {
    conn: Mutex<Connection>,
}

impl SqliteChangeTracker {
    /// Open (or create) a state database file and migrate it.
    pub fn open(path: &Path) -> TrackerResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> TrackerResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> TrackerResult<Self> {
        migrations::run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> TrackerResult<T>
    where
        F: FnOnce(&Connection) -> TrackerResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| TrackerError::Poisoned)?;
        f(&conn)
    }

    /// Most recent write time across all items, if anything was ever synced.
    pub fn last_synced_at(&self) -> TrackerResult<Option<String>> {
        self.with_conn(|conn| {
            let latest: Option<String> =
                conn.query_row("SELECT MAX(last_synced_at) FROM sync_state", [], |row| row.get(0))?;
            Ok(latest)
        })
    }

    /// Number of tracked items.
    pub fn item_count(&self) -> TrackerResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sync_state", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}

impl ChangeTracker for SqliteChangeTracker {
    fn detect_changes(&self, item: &SourceItem) -> TrackerResult<ChangeResult> {
        self.with_conn(|conn| {
            let stored: Option<(String, i64)> = conn
                .query_row(
                    "SELECT checksum, element_id FROM sync_state
                     WHERE scope = ?1 AND source_table = ?2 AND identity = ?3",
                    params![item.scope.0 as i64, item.table, item.identity],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            Ok(match stored {
                None => ChangeResult {
                    state: ItemState::New,
                    element_id: None,
                },
                Some((checksum, element_id)) => ChangeResult {
                    state: if checksum == item.checksum {
                        ItemState::Unchanged
                    } else {
                        ItemState::Changed
                    },
                    element_id: Some(ElementId(element_id as u64)),
                },
            })
        })
    }

    fn record(&self, run_id: &str, item: &SourceItem, element_id: ElementId) -> TrackerResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sync_state
                     (scope, source_table, identity, checksum, element_id, last_run, last_synced_at, sync_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)
                 ON CONFLICT (scope, source_table, identity) DO UPDATE SET
                     checksum = excluded.checksum,
                     element_id = excluded.element_id,
                     last_run = excluded.last_run,
                     last_synced_at = excluded.last_synced_at,
                     sync_version = sync_state.sync_version + 1",
                params![
                    item.scope.0 as i64,
                    item.table,
                    item.identity,
                    item.checksum,
                    element_id.0 as i64,
                    run_id,
                    now
                ],
            )?;
            Ok(())
        })
    }

    fn mark_seen(&self, run_id: &str, item: &SourceItem) -> TrackerResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE sync_state SET last_run = ?1
                 WHERE scope = ?2 AND source_table = ?3 AND identity = ?4",
                params![run_id, item.scope.0 as i64, item.table, item.identity],
            )?;
            Ok(())
        })
    }

    fn unseen(&self, run_id: &str, scope: ElementId, table: &str) -> TrackerResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT identity FROM sync_state
                 WHERE scope = ?1 AND source_table = ?2 AND last_run <> ?3
                 ORDER BY identity",
            )?;
            let identities = stmt
                .query_map(params![scope.0 as i64, table, run_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(identities)
        })
    }
}
