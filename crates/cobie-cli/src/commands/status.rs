//! Graph and tracker status.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use cobie_graph::{GraphClient, SqliteChangeTracker};

use crate::config::Config;

pub async fn execute(project_dir: &Path) -> Result<()> {
    let config = Config::load(project_dir)?;

    println!("{}", "Element Graph Status".bold());
    println!("{}", "─".repeat(40));

    let client = GraphClient::connect(&config.graph)
        .await
        .with_context(|| format!("Cannot reach Neo4j at {}", config.graph.uri))?;
    let counts = client.get_counts().await?;
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Models:        {}", counts.models.to_string().cyan());
    println!("  Elements:      {}", counts.elements.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());

    let state_path = config.state_path(project_dir);
    if state_path.is_file() {
        let tracker = SqliteChangeTracker::open(&state_path)?;
        println!("  Tracked rows:  {}", tracker.item_count()?.to_string().cyan());
        match tracker.last_synced_at()? {
            Some(time) => println!("  Last sync:     {}", time.green()),
            None => println!("  Last sync:     {}", "never".yellow()),
        }
    } else {
        println!("  Last sync:     {}", "never".yellow());
    }

    println!("{}", "─".repeat(40));
    Ok(())
}
