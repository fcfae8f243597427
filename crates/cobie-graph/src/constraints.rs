//! Neo4j constraints and indexes backing the element graph.

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use crate::GraphClient;

const CONSTRAINT_STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT element_id IF NOT EXISTS FOR (e:Element) REQUIRE e.id IS UNIQUE",
    "CREATE CONSTRAINT element_code IF NOT EXISTS FOR (e:Element) REQUIRE (e.code_spec, e.code_scope, e.code_value) IS UNIQUE",
    "CREATE CONSTRAINT model_id IF NOT EXISTS FOR (m:Model) REQUIRE m.id IS UNIQUE",
    "CREATE CONSTRAINT category_id IF NOT EXISTS FOR (c:Category) REQUIRE c.id IS UNIQUE",
    "CREATE CONSTRAINT subject_name IF NOT EXISTS FOR (s:Subject) REQUIRE s.name IS UNIQUE",
    "CREATE CONSTRAINT code_spec_name IF NOT EXISTS FOR (c:CodeSpec) REQUIRE c.name IS UNIQUE",
    "CREATE CONSTRAINT schema_name IF NOT EXISTS FOR (s:SchemaDocument) REQUIRE s.name IS UNIQUE",
    "CREATE INDEX model_name IF NOT EXISTS FOR (m:Model) ON (m.subject, m.name)",
    "CREATE INDEX category_name IF NOT EXISTS FOR (c:Category) ON (c.model, c.name)",
];

/// Create constraints and indexes. Safe to run repeatedly.
pub async fn initialize_constraints(client: &GraphClient) -> Result<()> {
    info!("Initializing Neo4j constraints...");

    for statement in CONSTRAINT_STATEMENTS {
        client.execute(Query::new(statement.to_string())).await?;
    }

    info!("Neo4j constraints initialized ({} statements)", CONSTRAINT_STATEMENTS.len());
    Ok(())
}
