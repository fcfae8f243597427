//! Connector job: one full synchronization of a source file.

use std::io::ErrorKind;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use cobie_core::{ClassRegistry, ElementId, ElementTree, ItemState, CODE_SPEC_NAME};
use cobie_schema::{DynamicSchema, SchemaSynthesizer, SchemaTemplates, SchemaVersion};
use cobie_source::{SourceError, SourceReader};

use crate::error::SyncError;
use crate::repository::Repository;
use crate::sync::{AlignmentEngine, SyncResult, SyncSession};
use crate::tracker::{ChangeTracker, SourceItem};

/// Tracker table under which source documents are recorded.
const DOCUMENT_TABLE: &str = "document";

/// Static configuration for a job.
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Run even when the source file is unchanged since the last run.
    pub force: bool,
    pub tree: ElementTree,
    pub registry: ClassRegistry,
    pub templates: SchemaTemplates,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            force: false,
            tree: ElementTree::cobie(),
            registry: ClassRegistry::cobie(),
            templates: SchemaTemplates::cobie(),
        }
    }
}

/// What a job did.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub run_id: Option<String>,
    pub job_subject: ElementId,
    pub source_state: ItemState,
    /// True when an unchanged source short-circuited the run.
    pub skipped: bool,
    pub schema_state: Option<ItemState>,
    pub schema_version: Option<SchemaVersion>,
    pub sync: SyncResult,
}

/// Job subject name for a source path.
pub fn job_subject_name(source_path: &Path) -> String {
    format!("COBieConnector:{}", source_path.display())
}

/// Run the whole connector lifecycle against `source_path`.
pub async fn run_job(
    repo: &dyn Repository,
    tracker: &dyn ChangeTracker,
    source_path: &Path,
    options: &JobOptions,
) -> Result<JobReport, SyncError> {
    let subject = repo.ensure_job_subject(&job_subject_name(source_path)).await?;

    let bytes = std::fs::read(source_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SourceError::NotFound(source_path.to_path_buf()),
        _ => SourceError::Io {
            path: source_path.to_path_buf(),
            source: e,
        },
    })?;
    let document = SourceItem::new(
        ElementId::ROOT_SUBJECT,
        DOCUMENT_TABLE,
        &source_path.display().to_string(),
        format!("{:x}", Sha256::digest(&bytes)),
    );
    let source_state = tracker.detect_changes(&document)?.state;
    info!(path = %source_path.display(), state = %source_state, "Source document");

    if source_state == ItemState::Unchanged && !options.force {
        info!("Source unchanged, nothing to do");
        return Ok(JobReport {
            run_id: None,
            job_subject: subject,
            source_state,
            skipped: true,
            schema_state: None,
            schema_version: None,
            sync: SyncResult::default(),
        });
    }

    let reader = SourceReader::open(source_path)?;

    // Schema
    let existing = match repo.schema_document(&options.templates.schema_name).await? {
        Some(doc) => Some(DynamicSchema::from_document(&doc)?),
        None => None,
    };
    let schema_result = SchemaSynthesizer::new(&reader, &options.templates).synthesize(existing.as_ref())?;
    if schema_result.state != ItemState::Unchanged {
        let document = schema_result.schema.to_document()?;
        repo.import_schema(&schema_result.schema.name, &document).await?;
        info!(version = %schema_result.schema.version, state = %schema_result.state, "Imported dynamic schema");
    }

    // Definitions
    let code_spec = repo.ensure_code_spec(CODE_SPEC_NAME).await?;

    // Data
    let mut session = SyncSession::new(subject, code_spec);
    let engine = AlignmentEngine::new(&schema_result.schema, &options.registry, &reader, repo, tracker);
    let sync = engine.align(&options.tree, &mut session).await?;

    tracker.record(&session.run_id, &document, subject)?;

    Ok(JobReport {
        run_id: Some(session.run_id),
        job_subject: subject,
        source_state,
        skipped: false,
        schema_state: Some(schema_result.state),
        schema_version: Some(schema_result.schema.version),
        sync,
    })
}
