//! Dynamic schema inspection.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use cobie_schema::{SchemaSynthesizer, SchemaTemplates};
use cobie_source::SourceReader;

use crate::config::Config;

#[derive(Args)]
pub struct SchemaArgs {
    /// COBie database (overrides [source] path)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Write the schema document here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: SchemaArgs, project_dir: &Path) -> Result<()> {
    let config = Config::load(project_dir)?;
    let source = config.source_path(project_dir, args.source)?;

    let reader = SourceReader::open(&source)
        .with_context(|| format!("Failed to open {}", source.display()))?;
    let templates = SchemaTemplates::cobie();
    let result = SchemaSynthesizer::new(&reader, &templates).synthesize(None)?;
    let document = result.schema.to_document()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Wrote {} {} ({} entity classes, {} relationship classes)",
                "✓".green().bold(),
                result.schema.name.cyan(),
                result.schema.version,
                result.schema.entity_classes.len(),
                result.schema.relationship_classes.len()
            );
            println!("  {}", path.display());
        }
        None => println!("{}", document),
    }

    Ok(())
}
