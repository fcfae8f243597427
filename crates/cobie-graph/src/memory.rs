//! In-process repository used for dry runs and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use cobie_core::{CategoryKind, Code, ElementId, ModelKind, Range3d};

use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::{ElementProps, Repository};

/// First id handed out; lower ids are reserved for fixed entities.
const FIRST_ID: u64 = 0x10;

/// Write counters, reset with [`MemoryRepository::reset_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub models_inserted: usize,
    pub categories_inserted: usize,
    pub elements_inserted: usize,
    pub elements_updated: usize,
    pub relationships_inserted: usize,
    pub extents_updates: usize,
    pub schema_imports: usize,
}

impl WriteStats {
    /// Element and relationship writes.
    pub fn data_writes(&self) -> usize {
        self.elements_inserted + self.elements_updated + self.relationships_inserted
    }
}

#[derive(Debug, Clone)]
struct Relationship {
    class_full_name: String,
    source: ElementId,
    target: ElementId,
}

struct Inner {
    next_id: u64,
    code_specs: HashMap<String, ElementId>,
    subjects: HashMap<String, ElementId>,
    models: HashMap<(ElementId, String), (ElementId, ModelKind)>,
    categories: HashMap<(ElementId, String), (ElementId, CategoryKind)>,
    elements: HashMap<ElementId, ElementProps>,
    codes: HashMap<Code, ElementId>,
    relationships: HashMap<ElementId, Relationship>,
    extents: Range3d,
    schemas: HashMap<String, String>,
    stats: WriteStats,
}

impl Inner {
    fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }
}

pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: FIRST_ID,
                code_specs: HashMap::new(),
                subjects: HashMap::new(),
                models: HashMap::new(),
                categories: HashMap::new(),
                elements: HashMap::new(),
                codes: HashMap::new(),
                relationships: HashMap::new(),
                extents: Range3d::null(),
                schemas: HashMap::new(),
                stats: WriteStats::default(),
            }),
        }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Backend(anyhow::anyhow!("memory repository lock poisoned")))
    }

    pub fn stats(&self) -> WriteStats {
        self.lock().map(|inner| inner.stats.clone()).unwrap_or_default()
    }

    pub fn reset_stats(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.stats = WriteStats::default();
        }
    }

    pub fn element_count(&self) -> usize {
        self.lock().map(|inner| inner.elements.len()).unwrap_or(0)
    }

    pub fn relationship_count(&self) -> usize {
        self.lock().map(|inner| inner.relationships.len()).unwrap_or(0)
    }

    /// All elements whose code value matches, in id order.
    pub fn elements_with_code_value(&self, value: &str) -> Vec<ElementProps> {
        let Ok(inner) = self.lock() else {
            return Vec::new();
        };
        let mut found: Vec<_> = inner
            .elements
            .values()
            .filter(|e| e.code.value == value)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ensure_code_spec(&self, name: &str) -> RepositoryResult<ElementId> {
        let mut inner = self.lock()?;
        if let Some(id) = inner.code_specs.get(name) {
            return Ok(*id);
        }
        let id = inner.allocate();
        inner.code_specs.insert(name.to_string(), id);
        Ok(id)
    }

    async fn ensure_job_subject(&self, name: &str) -> RepositoryResult<ElementId> {
        let mut inner = self.lock()?;
        if let Some(id) = inner.subjects.get(name) {
            return Ok(*id);
        }
        let id = inner.allocate();
        inner.subjects.insert(name.to_string(), id);
        Ok(id)
    }

    async fn find_model(&self, subject: ElementId, name: &str) -> RepositoryResult<Option<ElementId>> {
        let inner = self.lock()?;
        Ok(inner
            .models
            .get(&(subject, name.to_string()))
            .map(|(id, _)| *id))
    }

    async fn insert_model(&self, subject: ElementId, name: &str, kind: ModelKind) -> RepositoryResult<ElementId> {
        let mut inner = self.lock()?;
        let id = inner.allocate();
        inner.models.insert((subject, name.to_string()), (id, kind));
        inner.stats.models_inserted += 1;
        Ok(id)
    }

    async fn find_category(&self, model: ElementId, name: &str) -> RepositoryResult<Option<ElementId>> {
        let inner = self.lock()?;
        Ok(inner
            .categories
            .get(&(model, name.to_string()))
            .map(|(id, _)| *id))
    }

    async fn insert_category(&self, model: ElementId, name: &str, kind: CategoryKind) -> RepositoryResult<ElementId> {
        let mut inner = self.lock()?;
        let id = inner.allocate();
        inner.categories.insert((model, name.to_string()), (id, kind));
        inner.stats.categories_inserted += 1;
        Ok(id)
    }

    async fn find_element(&self, code: &Code) -> RepositoryResult<Option<ElementId>> {
        Ok(self.lock()?.codes.get(code).copied())
    }

    async fn get_element(&self, id: ElementId) -> RepositoryResult<ElementProps> {
        self.lock()?
            .elements
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::ElementNotFound(id))
    }

    async fn insert_element(&self, props: &ElementProps) -> RepositoryResult<ElementId> {
        let mut inner = self.lock()?;
        if inner.codes.contains_key(&props.code) {
            return Err(RepositoryError::DuplicateCode(props.code.to_string()));
        }
        let id = inner.allocate();
        let mut stored = props.clone();
        stored.id = Some(id);
        inner.codes.insert(props.code.clone(), id);
        inner.elements.insert(id, stored);
        inner.stats.elements_inserted += 1;
        Ok(id)
    }

    async fn update_element(&self, props: &ElementProps) -> RepositoryResult<()> {
        let id = props
            .id
            .ok_or_else(|| RepositoryError::MissingId(props.code.to_string()))?;

        let mut inner = self.lock()?;
        let old_code = match inner.elements.get(&id) {
            Some(existing) => existing.code.clone(),
            None => return Err(RepositoryError::ElementNotFound(id)),
        };
        if old_code != props.code {
            if inner.codes.contains_key(&props.code) {
                return Err(RepositoryError::DuplicateCode(props.code.to_string()));
            }
            inner.codes.remove(&old_code);
            inner.codes.insert(props.code.clone(), id);
        }
        inner.elements.insert(id, props.clone());
        inner.stats.elements_updated += 1;
        Ok(())
    }

    async fn find_relationship(
        &self,
        class_full_name: &str,
        source: ElementId,
        target: ElementId,
    ) -> RepositoryResult<Option<ElementId>> {
        let inner = self.lock()?;
        Ok(inner
            .relationships
            .iter()
            .find(|(_, r)| r.class_full_name == class_full_name && r.source == source && r.target == target)
            .map(|(id, _)| *id))
    }

    async fn insert_relationship(
        &self,
        class_full_name: &str,
        source: ElementId,
        target: ElementId,
    ) -> RepositoryResult<ElementId> {
        let mut inner = self.lock()?;
        for end in [source, target] {
            if !inner.elements.contains_key(&end) {
                return Err(RepositoryError::ElementNotFound(end));
            }
        }
        let id = inner.allocate();
        inner.relationships.insert(
            id,
            Relationship {
                class_full_name: class_full_name.to_string(),
                source,
                target,
            },
        );
        inner.stats.relationships_inserted += 1;
        Ok(id)
    }

    async fn project_extents(&self) -> RepositoryResult<Range3d> {
        Ok(self.lock()?.extents)
    }

    async fn update_project_extents(&self, extents: &Range3d) -> RepositoryResult<()> {
        let mut inner = self.lock()?;
        inner.extents = *extents;
        inner.stats.extents_updates += 1;
        Ok(())
    }

    async fn import_schema(&self, name: &str, document: &str) -> RepositoryResult<()> {
        let mut inner = self.lock()?;
        inner.schemas.insert(name.to_string(), document.to_string());
        inner.stats.schema_imports += 1;
        Ok(())
    }

    async fn schema_document(&self, name: &str) -> RepositoryResult<Option<String>> {
        Ok(self.lock()?.schemas.get(name).cloned())
    }
}
