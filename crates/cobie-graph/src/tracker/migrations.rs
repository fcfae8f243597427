//! State database migrations.

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::{TrackerError, TrackerResult};

const SCHEMA: &str = include_str!("schema.sql");

/// Bring the state database to the latest schema.
pub fn run_migrations(conn: &mut Connection) -> TrackerResult<()> {
    let migrations = Migrations::new(vec![M::up(SCHEMA)]);

    migrations
        .to_latest(conn)
        .map_err(|e| TrackerError::Migration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        // Second run is a no-op.
        run_migrations(&mut conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='sync_state'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
