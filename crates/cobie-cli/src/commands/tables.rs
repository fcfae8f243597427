//! Source database overview.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use cobie_source::SourceReader;

use crate::config::Config;
use crate::output::truncate;

#[derive(Args)]
pub struct TablesArgs {
    /// COBie database (overrides [source] path)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// List every column of each table
    #[arg(long)]
    pub columns: bool,
}

pub async fn execute(args: TablesArgs, project_dir: &Path) -> Result<()> {
    let config = Config::load(project_dir)?;
    let source = config.source_path(project_dir, args.source)?;
    let reader = SourceReader::open(&source)
        .with_context(|| format!("Failed to open {}", source.display()))?;

    let tables = reader.list_tables()?;
    if tables.is_empty() {
        println!("{}", "No tables found.".dimmed());
        return Ok(());
    }

    println!("{:<24} {:<14} {:>8} {:>8}", "Table", "Key", "Columns", "Rows");
    println!("{}", "─".repeat(57));

    for table in &tables {
        let columns = reader.list_columns(&table.name)?;
        let rows = reader.count_rows(&table.name)?;
        println!(
            "{:<24} {:<14} {:>8} {:>8}",
            truncate(&table.name, 23).as_str().cyan(),
            reader.primary_key_column(&table.name),
            columns.len(),
            rows
        );

        if args.columns {
            for column in &columns {
                let ty = if column.declared_type.is_empty() {
                    "-"
                } else {
                    column.declared_type.as_str()
                };
                println!("    {:<28} {}", column.name, ty.dimmed());
            }
        }
    }

    println!("\n{} tables", tables.len().to_string().bold());
    Ok(())
}
