//! Full synchronization job.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cobie_graph::{
    initialize_constraints, run_job, GraphClient, JobOptions, MemoryRepository, Neo4jRepository,
    Repository, SqliteChangeTracker,
};

use crate::config::Config;
use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// COBie database (overrides [source] path)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Run against an in-memory graph and tracker; nothing is persisted
    #[arg(long)]
    pub dry_run: bool,

    /// Run even when the source file has not changed
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: SyncArgs, project_dir: &Path) -> Result<()> {
    let config = Config::load(project_dir)?;
    let source = config.source_path(project_dir, args.source)?;
    let options = JobOptions {
        force: args.force,
        tree: config.element_tree(project_dir)?,
        ..Default::default()
    };

    println!("{} {}", "Syncing".bold(), source.display().to_string().cyan());

    let (repo, tracker): (Box<dyn Repository>, SqliteChangeTracker) = if args.dry_run {
        println!("  {}", "dry run: using an in-memory graph".dimmed());
        (
            Box::new(MemoryRepository::new()),
            SqliteChangeTracker::in_memory().context("Failed to create change tracker")?,
        )
    } else {
        let client = GraphClient::connect(&config.graph)
            .await
            .with_context(|| format!("Cannot reach Neo4j at {}", config.graph.uri))?;
        initialize_constraints(&client).await?;

        let state_path = config.state_path(project_dir);
        if let Some(parent) = state_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let tracker = SqliteChangeTracker::open(&state_path)
            .with_context(|| format!("Failed to open change tracker {}", state_path.display()))?;
        (Box::new(Neo4jRepository::new(client)), tracker)
    };

    info!(source = %source.display(), dry_run = args.dry_run, force = args.force, "Starting job");
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")?);
    spinner.set_message("Aligning source with graph...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = run_job(repo.as_ref(), &tracker, &source, &options).await;
    spinner.finish_and_clear();

    let report = report.with_context(|| format!("Sync of {} failed", source.display()))?;
    output::print_job_report(&report, args.dry_run);

    Ok(())
}
