//! Neo4j connection client.

use anyhow::{Context, Result};
use neo4rs::{ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "cobie_dev".to_string(),
        }
    }
}

/// Client for the target element graph.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect and ping.
    ///
    /// `Graph::connect` only builds the pool; the `RETURN 1` forces a real bolt
    /// handshake so an unreachable server fails here rather than mid-run.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db("neo4j")
            .max_connections(4)
            .fetch_size(200)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await.context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.context("Failed to read Neo4j result")? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> Result<Option<T>> {
        let rows = self.query(query).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let val: T = row
                    .get(field)
                    .map_err(|e| anyhow::anyhow!("Failed to get field '{}': {:?}", field, e))?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    /// Node and relationship counts for status display.
    pub async fn get_counts(&self) -> Result<GraphCounts> {
        let count = |cypher: &str| Query::new(cypher.to_string());

        let elements: i64 = self
            .query_scalar(count("MATCH (e:Element) RETURN count(e) AS count"), "count")
            .await?
            .unwrap_or(0);
        let models: i64 = self
            .query_scalar(count("MATCH (m:Model) RETURN count(m) AS count"), "count")
            .await?
            .unwrap_or(0);
        let links: i64 = self
            .query_scalar(count("MATCH (:Element)-[r:RELATES]->(:Element) RETURN count(r) AS count"), "count")
            .await?
            .unwrap_or(0);
        let nodes: i64 = self
            .query_scalar(count("MATCH (n) RETURN count(n) AS count"), "count")
            .await?
            .unwrap_or(0);

        Ok(GraphCounts {
            nodes: nodes as usize,
            elements: elements as usize,
            models: models as usize,
            relationships: links as usize,
        })
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone)]
pub struct GraphCounts {
    pub nodes: usize,
    pub elements: usize,
    pub models: usize,
    pub relationships: usize,
}
