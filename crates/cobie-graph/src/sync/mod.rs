//! Source-to-graph alignment.
//!
//! Walks the element tree model by model: resolves the model, then its
//! categories, then writes element classes in declared order and finally the
//! relationship classes. Only rows the change tracker reports as new or
//! changed are written.

pub mod elements;
pub mod models;
pub mod relationships;

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use cobie_core::{ClassRegistry, ElementId, ElementTree, MappingNode, Range3d};
use cobie_schema::DynamicSchema;
use cobie_source::SourceReader;

use crate::error::SyncError;
use crate::repository::Repository;
use crate::tracker::ChangeTracker;

/// Counters for one alignment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub models_created: usize,
    pub categories_created: usize,
    pub elements_inserted: usize,
    pub elements_updated: usize,
    pub elements_unchanged: usize,
    pub rows_skipped: usize,
    pub relationships_created: usize,
    pub relationships_updated: usize,
    /// Tracked items that no longer appear in the source.
    pub stale_elements: usize,
}

impl SyncResult {
    pub fn merge(&mut self, other: &SyncResult) {
        self.models_created += other.models_created;
        self.categories_created += other.categories_created;
        self.elements_inserted += other.elements_inserted;
        self.elements_updated += other.elements_updated;
        self.elements_unchanged += other.elements_unchanged;
        self.rows_skipped += other.rows_skipped;
        self.relationships_created += other.relationships_created;
        self.relationships_updated += other.relationships_updated;
        self.stale_elements += other.stale_elements;
    }

    /// Element and relationship writes.
    pub fn writes(&self) -> usize {
        self.elements_inserted
            + self.elements_updated
            + self.relationships_created
            + self.relationships_updated
    }
}

/// Per-run state. Created for one run and dropped at its end.
#[derive(Debug)]
pub struct SyncSession {
    pub run_id: String,
    pub job_subject: ElementId,
    pub code_spec: ElementId,
    /// Model ids by model name.
    pub model_cache: HashMap<String, ElementId>,
    /// Category ids by category name.
    pub category_cache: HashMap<String, ElementId>,
    /// Element ids by (model, code value).
    pub element_cache: HashMap<(ElementId, String), ElementId>,
    /// Project extents as loaded at the start of the run, grown (and
    /// written) as elements are placed.
    pub extents: Range3d,
}

impl SyncSession {
    pub fn new(job_subject: ElementId, code_spec: ElementId) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            job_subject,
            code_spec,
            model_cache: HashMap::new(),
            category_cache: HashMap::new(),
            element_cache: HashMap::new(),
            extents: Range3d::null(),
        }
    }

    pub fn model(&self, name: &str) -> Result<ElementId, SyncError> {
        self.model_cache
            .get(name)
            .copied()
            .ok_or_else(|| SyncError::lookup("model", name))
    }

    pub fn category(&self, name: &str) -> Result<ElementId, SyncError> {
        self.category_cache
            .get(name)
            .copied()
            .ok_or_else(|| SyncError::lookup("category", name))
    }
}

/// Writes the source described by an element tree into the repository.
pub struct AlignmentEngine<'a> {
    pub(crate) schema: &'a DynamicSchema,
    pub(crate) registry: &'a ClassRegistry,
    pub(crate) reader: &'a SourceReader,
    pub(crate) repo: &'a dyn Repository,
    pub(crate) tracker: &'a dyn ChangeTracker,
}

impl<'a> AlignmentEngine<'a> {
    pub fn new(
        schema: &'a DynamicSchema,
        registry: &'a ClassRegistry,
        reader: &'a SourceReader,
        repo: &'a dyn Repository,
        tracker: &'a dyn ChangeTracker,
    ) -> Self {
        Self {
            schema,
            registry,
            reader,
            repo,
            tracker,
        }
    }

    /// Align every model of `tree` in declared order.
    pub async fn align(&self, tree: &ElementTree, session: &mut SyncSession) -> Result<SyncResult, SyncError> {
        tree.validate(self.registry)?;
        info!(run_id = %session.run_id, subject = %session.job_subject, "Starting alignment");

        session.extents = self.repo.project_extents().await?;

        let mut total = SyncResult::default();
        for model in &tree.models {
            let mut result = SyncResult::default();

            let model_id = self.resolve_or_create_model(session, model, &mut result).await?;
            self.resolve_or_create_categories(session, model, model_id, &mut result)
                .await?;

            for node in &model.nodes {
                if let MappingNode::ElementClass(class) = node {
                    let class_result = self.update_element_class(session, model_id, class).await?;
                    result.merge(&class_result);
                }
            }

            for node in &model.nodes {
                if let MappingNode::RelationshipClass(rel) = node {
                    let rel_result = self.update_relationship_class(session, rel).await?;
                    result.merge(&rel_result);
                }
            }

            info!(
                model = %model.name,
                inserted = result.elements_inserted,
                updated = result.elements_updated,
                unchanged = result.elements_unchanged,
                rels = result.relationships_created + result.relationships_updated,
                "Model aligned"
            );
            total.merge(&result);
        }

        info!(
            elements_inserted = total.elements_inserted,
            elements_updated = total.elements_updated,
            elements_unchanged = total.elements_unchanged,
            relationships = total.relationships_created + total.relationships_updated,
            stale = total.stale_elements,
            "Alignment complete"
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_result_merge() {
        let mut total = SyncResult {
            elements_inserted: 2,
            ..Default::default()
        };
        total.merge(&SyncResult {
            elements_inserted: 1,
            elements_updated: 3,
            relationships_created: 4,
            ..Default::default()
        });
        assert_eq!(total.elements_inserted, 3);
        assert_eq!(total.writes(), 10);
    }

    #[test]
    fn test_session_lookups() {
        let mut session = SyncSession::new(ElementId(0x11), ElementId(0x10));
        session.model_cache.insert("PhysicalModel1".into(), ElementId(0x12));
        assert_eq!(session.model("PhysicalModel1").unwrap(), ElementId(0x12));
        assert!(matches!(
            session.category("SpatialCategory1"),
            Err(SyncError::Lookup { kind: "category", .. })
        ));
        assert!(session.extents.is_null());
    }
}
