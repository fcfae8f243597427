//! CLI command definitions and handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

pub mod schema;
pub mod status;
pub mod sync;
pub mod tables;

/// COBie to element graph connector
#[derive(Parser)]
#[command(name = "cobie-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, env = "COBIE_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize the source database into the graph
    Sync(sync::SyncArgs),

    /// Print or write the synthesized dynamic schema
    Schema(schema::SchemaArgs),

    /// List source tables, columns and row counts
    Tables(tables::TablesArgs),

    /// Show graph counts and the last sync time
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let project_dir = match self.project {
            Some(dir) => dir,
            None => std::env::current_dir().context("Cannot determine the current directory")?,
        };

        match self.command {
            Commands::Sync(args) => sync::execute(args, &project_dir).await,
            Commands::Schema(args) => schema::execute(args, &project_dir).await,
            Commands::Tables(args) => tables::execute(args, &project_dir).await,
            Commands::Status => status::execute(&project_dir).await,
        }
    }
}
