//! Target repository interface.
//!
//! Everything the alignment engine and the job write goes through
//! [`Repository`]. Elements are identified by [`Code`]; models and categories
//! by name within their parent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cobie_core::{CategoryKind, Code, ElementId, FieldValue, ModelKind, Placement3d, Range3d};

use crate::error::RepositoryResult;

/// Navigation property value: the element pointed at and the relationship
/// class the link stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedElement {
    pub id: ElementId,
    pub rel_class_name: String,
}

impl RelatedElement {
    pub fn new(id: ElementId, rel_class_name: impl Into<String>) -> Self {
        Self {
            id,
            rel_class_name: rel_class_name.into(),
        }
    }
}

/// Full property set of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementProps {
    /// `None` until the element has been inserted.
    pub id: Option<ElementId>,
    pub class_full_name: String,
    pub model: ElementId,
    pub code: Code,
    pub user_label: Option<String>,
    pub category: Option<ElementId>,
    pub placement: Option<Placement3d>,
    /// Navigation properties by name, e.g. `typeDefinition` or `parent`.
    #[serde(default)]
    pub related: BTreeMap<String, RelatedElement>,
    #[serde(default)]
    pub properties: BTreeMap<String, FieldValue>,
}

impl ElementProps {
    pub fn new(class_full_name: impl Into<String>, model: ElementId, code: Code) -> Self {
        Self {
            id: None,
            class_full_name: class_full_name.into(),
            model,
            code,
            user_label: None,
            category: None,
            placement: None,
            related: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Register a code specification, returning the existing id if present.
    async fn ensure_code_spec(&self, name: &str) -> RepositoryResult<ElementId>;

    /// Subject under the root subject that owns this job's models.
    async fn ensure_job_subject(&self, name: &str) -> RepositoryResult<ElementId>;

    async fn find_model(&self, subject: ElementId, name: &str) -> RepositoryResult<Option<ElementId>>;

    async fn insert_model(&self, subject: ElementId, name: &str, kind: ModelKind) -> RepositoryResult<ElementId>;

    async fn find_category(&self, model: ElementId, name: &str) -> RepositoryResult<Option<ElementId>>;

    async fn insert_category(&self, model: ElementId, name: &str, kind: CategoryKind) -> RepositoryResult<ElementId>;

    async fn find_element(&self, code: &Code) -> RepositoryResult<Option<ElementId>>;

    async fn get_element(&self, id: ElementId) -> RepositoryResult<ElementProps>;

    /// Insert a new element. Fails with `DuplicateCode` if the code is taken.
    async fn insert_element(&self, props: &ElementProps) -> RepositoryResult<ElementId>;

    /// Replace an existing element's properties. `props.id` must be set.
    async fn update_element(&self, props: &ElementProps) -> RepositoryResult<()>;

    async fn find_relationship(
        &self,
        class_full_name: &str,
        source: ElementId,
        target: ElementId,
    ) -> RepositoryResult<Option<ElementId>>;

    async fn insert_relationship(
        &self,
        class_full_name: &str,
        source: ElementId,
        target: ElementId,
    ) -> RepositoryResult<ElementId>;

    /// Current project extents; null when nothing has been placed yet.
    async fn project_extents(&self) -> RepositoryResult<Range3d>;

    async fn update_project_extents(&self, extents: &Range3d) -> RepositoryResult<()>;

    /// Store a schema document, replacing any earlier one of the same name.
    async fn import_schema(&self, name: &str, document: &str) -> RepositoryResult<()>;

    async fn schema_document(&self, name: &str) -> RepositoryResult<Option<String>>;
}
