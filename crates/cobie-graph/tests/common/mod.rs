//! Shared fixture: a small but complete COBie intermediary database.

#![allow(dead_code)]

use rusqlite::Connection;

use cobie_core::{ClassRegistry, ElementId, ElementTree, CODE_SPEC_NAME};
use cobie_graph::{
    AlignmentEngine, MemoryRepository, Repository, SqliteChangeTracker, SyncError, SyncResult,
    SyncSession,
};
use cobie_schema::{DynamicSchema, SchemaSynthesizer, SchemaTemplates};
use cobie_source::{JoinMap, SourcePool, SourceReader};

pub const SPACE_COUNT: usize = 22;
pub const ELEMENT_COUNT: usize = 43;

const DDL: &str = "
    CREATE TABLE Contact (id INTEGER PRIMARY KEY, email TEXT, company TEXT, phone TEXT);
    CREATE TABLE Facility (id INTEGER PRIMARY KEY, name TEXT, category TEXT, projectname TEXT, sitename TEXT);
    CREATE TABLE Floor (id INTEGER PRIMARY KEY, name TEXT, category TEXT, elevation TEXT, height TEXT);
    CREATE TABLE Space (id INTEGER PRIMARY KEY, name TEXT, category TEXT, floorname TEXT, description TEXT,
                        usableheight TEXT, grossarea TEXT, netarea TEXT);
    CREATE TABLE Zone (id INTEGER PRIMARY KEY, name TEXT, category TEXT, spacenames TEXT);
    CREATE TABLE Type (id INTEGER PRIMARY KEY, name TEXT, category TEXT, description TEXT, nominallength TEXT);
    CREATE TABLE Component (id INTEGER PRIMARY KEY, name TEXT, typename TEXT, space TEXT, description TEXT);
    CREATE TABLE System (id INTEGER PRIMARY KEY, name TEXT, category TEXT, componentnames TEXT);
    CREATE TABLE Assembly (id INTEGER PRIMARY KEY, name TEXT, parentname TEXT, childnames TEXT);
    CREATE TABLE Connection (id INTEGER PRIMARY KEY, name TEXT, rowname1 TEXT, rowname2 TEXT);
    CREATE TABLE Spare (id INTEGER PRIMARY KEY, name TEXT, typename TEXT);
    CREATE TABLE Resource (id INTEGER PRIMARY KEY, name TEXT, category TEXT);
    CREATE TABLE Job (id INTEGER PRIMARY KEY, name TEXT, duration TEXT);
    CREATE TABLE Impact (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE Document (id INTEGER PRIMARY KEY, name TEXT, directory TEXT);
    CREATE TABLE Attribute (id INTEGER PRIMARY KEY, name TEXT, value TEXT);
    CREATE TABLE Issue (id INTEGER PRIMARY KEY, name TEXT, risk TEXT);
    CREATE TABLE Coordinate (id INTEGER PRIMARY KEY, name TEXT, category TEXT,
                             coordinatexaxis TEXT, coordinateyaxis TEXT, coordinatezaxis TEXT);
";

const DATA: &str = "
    INSERT INTO Contact (email, company, phone) VALUES ('fm@example.com', 'Example FM', '555-0100');
    INSERT INTO Facility (name, category, projectname, sitename) VALUES ('Building A', 'Office', 'Renovation', 'North Campus');
    INSERT INTO Floor (name, category, elevation, height) VALUES
        ('Level 1', 'Floor', '0', '3.5'),
        ('Level 2', 'Floor', '3.5', '3.5');
    INSERT INTO Type (name, category, description, nominallength) VALUES
        ('Door Type', 'Doors', 'Single leaf door', '0.9'),
        ('Pump Type', 'Pumps', 'Circulation pump', '');
    INSERT INTO Component (name, typename, space, description) VALUES
        ('Door-1', 'Door Type', '101', 'Entrance door'),
        ('Pump-1', 'Pump Type', '120', 'Primary pump'),
        ('Pump-2', '', '120', 'Standby pump');
    INSERT INTO System (name, category, componentnames) VALUES ('HVAC', 'Heating', 'Pump-1,Pump-2');
    INSERT INTO Assembly (name, parentname, childnames) VALUES ('Pump set', 'Pump-1', 'Door-1, Pump-2');
    INSERT INTO Connection (name, rowname1, rowname2) VALUES
        ('C1', 'Door-1', 'Pump-1'),
        ('C2', 'Pump-1', 'Missing-9');
    INSERT INTO Spare (name, typename) VALUES ('Seal kit', 'Pump Type');
    INSERT INTO Resource (name, category) VALUES ('Ladder', 'Equipment');
    INSERT INTO Job (name, duration) VALUES ('Inspect pump', '2.5');
    INSERT INTO Impact (name) VALUES ('Energy');
    INSERT INTO Document (name, directory) VALUES ('Pump manual', 'docs/');
    INSERT INTO Attribute (name, value) VALUES ('FireRating', '60');
    INSERT INTO Issue (name, risk) VALUES ('Access', 'Low');
    INSERT INTO Zone (name, category, spacenames) VALUES ('Zone North', 'Occupancy', '101,102,103');
    INSERT INTO Coordinate (name, category, coordinatexaxis, coordinateyaxis, coordinatezaxis) VALUES
        ('101', 'point', '10', '20', '3'),
        ('Door-1', 'point', '5', '5', '0'),
        ('Level 1', 'point', '0', '0', '0');
";

/// Create and seed the fixture tables on `conn`.
pub fn seed(conn: &Connection) {
    conn.execute_batch(DDL).unwrap();
    conn.execute_batch(DATA).unwrap();
    for n in 0..SPACE_COUNT {
        let floor = if n < 11 { "Level 1" } else { "Level 2" };
        conn.execute(
            "INSERT INTO Space (name, category, floorname, description, usableheight, grossarea, netarea)
             VALUES (?1, 'Office', ?2, 'Room', '3', ?3, '')",
            rusqlite::params![format!("{}", 101 + n), floor, format!("{}.5", 10 + n)],
        )
        .unwrap();
    }
}

pub fn source() -> SourceReader {
    let conn = Connection::open_in_memory().unwrap();
    seed(&conn);
    SourceReader::new(SourcePool::from_connection(conn), JoinMap::cobie())
}

/// Run SQL against the fixture, e.g. to edit rows between runs.
pub fn execute(reader: &SourceReader, sql: &str) {
    reader
        .pool()
        .with_conn(|conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
        .unwrap();
}

/// Reader, repository and tracker wired together for repeated runs.
pub struct Harness {
    pub reader: SourceReader,
    pub repo: MemoryRepository,
    pub tracker: SqliteChangeTracker,
    pub registry: ClassRegistry,
    pub tree: ElementTree,
    pub schema: DynamicSchema,
    pub subject: ElementId,
    pub code_spec: ElementId,
}

impl Harness {
    pub async fn new() -> Self {
        let reader = source();
        let schema = SchemaSynthesizer::new(&reader, &SchemaTemplates::cobie())
            .synthesize(None)
            .unwrap()
            .schema;
        let repo = MemoryRepository::new();
        let subject = repo.ensure_job_subject("COBieConnector:fixture").await.unwrap();
        let code_spec = repo.ensure_code_spec(CODE_SPEC_NAME).await.unwrap();

        Self {
            reader,
            repo,
            tracker: SqliteChangeTracker::in_memory().unwrap(),
            registry: ClassRegistry::cobie(),
            tree: ElementTree::cobie(),
            schema,
            subject,
            code_spec,
        }
    }

    pub async fn try_run(&self) -> Result<SyncResult, SyncError> {
        self.try_run_tree(&self.tree).await
    }

    pub async fn try_run_tree(&self, tree: &ElementTree) -> Result<SyncResult, SyncError> {
        let mut session = SyncSession::new(self.subject, self.code_spec);
        AlignmentEngine::new(&self.schema, &self.registry, &self.reader, &self.repo, &self.tracker)
            .align(tree, &mut session)
            .await
    }

    pub async fn run(&self) -> SyncResult {
        self.try_run().await.unwrap()
    }

    /// The single element with `code_value`.
    pub fn element(&self, code_value: &str) -> cobie_graph::ElementProps {
        let mut found = self.repo.elements_with_code_value(code_value);
        assert_eq!(found.len(), 1, "expected one element {}", code_value);
        found.remove(0)
    }
}
