//! cobie-sync - COBie to element graph connector
//!
//! Reads a COBie intermediary SQLite database and keeps a Neo4j element
//! graph in step with it.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use commands::Cli;

/// Non-blocking writer for the log file, creating its directory first.
fn open_log_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("cobie-sync.log");
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize tracing, optionally mirroring output into a log file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(log_file: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_filter = if verbose {
        "cobie_sync=debug,cobie_graph=debug,cobie_schema=debug"
    } else {
        "cobie_sync=info,cobie_graph=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let (writer, guard) = open_log_writer(path)?;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref(), cli.verbose)?;

    cli.execute().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_under_a_file_is_error() {
        let blocker = std::env::temp_dir().join(format!("cobie-log-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"").unwrap();

        let result = open_log_writer(&blocker.join("logs").join("sync.log"));
        assert!(result.is_err());

        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn test_log_file_is_created() {
        let dir = std::env::temp_dir().join(format!("cobie-log-{}", std::process::id()));
        let path = dir.join("sync.log");

        let (_writer, guard) = open_log_writer(&path).unwrap();
        drop(guard);
        assert!(path.is_file());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
