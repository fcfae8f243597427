//! Table enumeration and joined row projection.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use tracing::debug;

use cobie_core::{FieldValue, Row};

use crate::keys::{self, JoinMap};
use crate::pool::{SourceError, SourcePool, SourceResult};

/// A user table of the source database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
}

/// One column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Reads tables, columns and joined rows from the intermediary database.
pub struct SourceReader {
    pool: SourcePool,
    joins: JoinMap,
}

impl SourceReader {
    pub fn new(pool: SourcePool, joins: JoinMap) -> Self {
        Self { pool, joins }
    }

    /// Open a database file with the COBie join map.
    pub fn open(path: &Path) -> SourceResult<Self> {
        Ok(Self::new(SourcePool::open(path)?, JoinMap::cobie()))
    }

    pub fn pool(&self) -> &SourcePool {
        &self.pool
    }

    pub fn list_tables(&self) -> SourceResult<Vec<TableInfo>> {
        self.pool.with_conn(list_tables)
    }

    pub fn list_columns(&self, table: &str) -> SourceResult<Vec<ColumnInfo>> {
        self.pool.with_conn(|conn| list_columns(conn, table))
    }

    pub fn primary_key_column(&self, table: &str) -> &'static str {
        keys::primary_key_column(table)
    }

    pub fn count_rows(&self, table: &str) -> SourceResult<usize> {
        self.pool.with_conn(|conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", quote(table)),
                params![],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    /// Build the joined projection for `table`: every declared join is a left
    /// outer join, every column is aliased `<table>.<column>`, and rows are
    /// grouped by the primary-key alias.
    pub fn build_query(&self, table: &str) -> SourceResult<String> {
        self.pool.with_conn(|conn| {
            let base_columns = list_columns(conn, table)?;
            if base_columns.is_empty() {
                return Err(SourceError::UnknownTable(table.to_string()));
            }

            let primary_key = keys::primary_key_column(table);
            if !base_columns.iter().any(|c| c.name == primary_key) {
                return Err(SourceError::MissingPrimaryKey {
                    table: table.to_string(),
                    column: primary_key.to_string(),
                });
            }

            let mut selected = vec![aliased_columns(table, &base_columns)];
            let mut joins = Vec::new();

            for fk in self.joins.joins_for(table) {
                let referenced = list_columns(conn, &fk.referenced_table)?;
                if referenced.is_empty() {
                    return Err(SourceError::MissingJoinTable {
                        table: fk.table.clone(),
                        column: fk.column.clone(),
                        referenced: fk.referenced_table.clone(),
                    });
                }
                selected.push(aliased_columns(&fk.referenced_table, &referenced));
                joins.push(format!(
                    "LEFT OUTER JOIN {rt} ON {t}.{c} = {rt}.{rc}",
                    rt = quote(&fk.referenced_table),
                    t = quote(table),
                    c = quote(&fk.column),
                    rc = quote(&fk.referenced_column),
                ));
            }

            let mut query = format!("SELECT {} FROM {}", selected.join(", "), quote(table));
            for join in joins {
                query.push(' ');
                query.push_str(&join);
            }
            query.push_str(&format!(" GROUP BY {}", quote(&format!("{}.{}", table, primary_key))));
            Ok(query)
        })
    }

    /// Fetch the joined rows of `table` in query order.
    pub fn fetch_rows(&self, table: &str) -> SourceResult<Vec<Row>> {
        let query = self.build_query(table)?;

        let rows = self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare(&query)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

            let mut rows = Vec::new();
            let mut cursor = stmt.query(params![])?;
            while let Some(r) = cursor.next()? {
                let mut row = Row::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    row.push(name.clone(), to_field_value(r.get_ref(idx)?));
                }
                rows.push(row);
            }
            Ok(rows)
        })?;

        debug!(table, rows = rows.len(), "Fetched source rows");
        Ok(rows)
    }

    /// Rows of every table, in table order.
    pub fn fetch_all(&self) -> SourceResult<Vec<(String, Vec<Row>)>> {
        let mut all = Vec::new();
        for table in self.list_tables()? {
            let rows = self.fetch_rows(&table.name)?;
            all.push((table.name, rows));
        }
        Ok(all)
    }
}

fn list_tables(conn: &Connection) -> SourceResult<Vec<TableInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY rowid",
    )?;
    let tables = stmt
        .query_map(params![], |row| Ok(TableInfo { name: row.get(0)? }))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tables)
}

fn list_columns(conn: &Connection, table: &str) -> SourceResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(table)))?;
    let columns = stmt
        .query_map(params![], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                not_null: row.get::<_, i64>(3)? != 0,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn aliased_columns(table: &str, columns: &[ColumnInfo]) -> String {
    columns
        .iter()
        .map(|c| {
            format!(
                "{}.{} AS {}",
                quote(table),
                quote(&c.name),
                quote(&format!("{}.{}", table, c.name))
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn to_field_value(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(i) => FieldValue::Integer(i),
        ValueRef::Real(f) => FieldValue::Double(f),
        ValueRef::Text(t) => FieldValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => FieldValue::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SourceReader {
        let pool = SourcePool::in_memory().unwrap();
        pool.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE Space (id INTEGER PRIMARY KEY, name TEXT, floorname TEXT, grossarea TEXT);
                 CREATE TABLE Coordinate (id INTEGER PRIMARY KEY, name TEXT,
                     coordinatexaxis TEXT, coordinateyaxis TEXT, coordinatezaxis TEXT);
                 CREATE TABLE Zone (id INTEGER PRIMARY KEY, name TEXT, spacenames TEXT);
                 INSERT INTO Space (name, floorname, grossarea) VALUES
                     ('101', 'Level 1', '12.5'),
                     ('102', 'Level 1', '8'),
                     ('101', 'Level 1', '12.5');
                 INSERT INTO Coordinate (name, coordinatexaxis, coordinateyaxis, coordinatezaxis) VALUES
                     ('101', '1.0', '2.0', '0.0');
                 INSERT INTO Zone (name, spacenames) VALUES ('North', '101,102');",
            )?;
            Ok(())
        })
        .unwrap();
        SourceReader::new(pool, JoinMap::cobie())
    }

    #[test]
    fn test_list_tables_and_columns() {
        let reader = fixture();
        let tables: Vec<_> = reader.list_tables().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tables, vec!["Space", "Coordinate", "Zone"]);

        let columns = reader.list_columns("Space").unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "floorname", "grossarea"]);
        assert!(columns[0].primary_key);
        assert_eq!(columns[1].declared_type, "TEXT");
    }

    #[test]
    fn test_fetch_rows_joins_and_aliases() {
        let reader = fixture();
        let rows = reader.fetch_rows("Space").unwrap();
        // duplicate '101' collapses into one group
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.get("Space.name"), &FieldValue::Text("101".into()));
        assert_eq!(first.get("Coordinate.coordinatexaxis"), &FieldValue::Text("1.0".into()));
        assert!(first.contains("Coordinate.id"));

        let second = &rows[1];
        assert_eq!(second.get("Space.name"), &FieldValue::Text("102".into()));
        assert!(second.get("Coordinate.id").is_null());
    }

    #[test]
    fn test_fetch_rows_without_joins() {
        let reader = fixture();
        let rows = reader.fetch_rows("Zone").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0].get("Zone.spacenames"), &FieldValue::Text("101,102".into()));
    }

    #[test]
    fn test_missing_join_table_is_error() {
        let pool = SourcePool::in_memory().unwrap();
        pool.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE Floor (id INTEGER PRIMARY KEY, name TEXT);")?;
            Ok(())
        })
        .unwrap();
        let reader = SourceReader::new(pool, JoinMap::cobie());
        assert!(matches!(
            reader.fetch_rows("Floor"),
            Err(SourceError::MissingJoinTable { .. })
        ));
    }

    #[test]
    fn test_unknown_table_and_missing_key() {
        let reader = fixture();
        assert!(matches!(reader.fetch_rows("Nope"), Err(SourceError::UnknownTable(_))));

        reader
            .pool()
            .with_conn(|conn| {
                conn.execute_batch("CREATE TABLE Contact (id INTEGER PRIMARY KEY, company TEXT);")?;
                Ok(())
            })
            .unwrap();
        assert!(matches!(
            reader.fetch_rows("Contact"),
            Err(SourceError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_count_rows() {
        let reader = fixture();
        assert_eq!(reader.count_rows("Space").unwrap(), 3);
    }

    #[test]
    fn test_open_missing_file() {
        let err = SourceReader::open(Path::new("/definitely/not/here.db")).err().unwrap();
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
