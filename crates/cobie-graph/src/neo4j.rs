//! Neo4j-backed repository.
//!
//! Graph layout:
//!
//! - `(:Subject)-[:CHILD_OF]->(:Subject)` job subjects under the root subject
//! - `(:Model)-[:UNDER]->(:Subject)`, `(:Category)-[:IN_MODEL]->(:Model)`
//! - `(:Element)-[:IN_MODEL]->(:Model)`, `(:Element)-[:IN_CATEGORY]->(:Category)`
//! - `(:Element)-[:NAVIGATES {name}]->(:Element)` for navigation properties
//! - `(:Element)-[:RELATES {id, class_name}]->(:Element)` for link records
//!
//! The full element property set is kept as JSON in `Element.data`; code
//! parts, class and label are stored alongside for lookups.

use anyhow::anyhow;
use async_trait::async_trait;
use neo4rs::Query;
use tracing::debug;

use cobie_core::{CategoryKind, Code, ElementId, ModelKind, Point3d, Range3d};

use crate::client::GraphClient;
use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::{ElementProps, Repository};

const ROOT_SUBJECT_NAME: &str = "__root__";
const FIRST_ID: i64 = 0x10;

pub struct Neo4jRepository {
    client: GraphClient,
}

impl Neo4jRepository {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    async fn next_id(&self) -> RepositoryResult<ElementId> {
        let query = Query::new(
            "MERGE (q:IdSequence {name: 'element'})
             ON CREATE SET q.value = $start
             SET q.value = q.value + 1
             RETURN q.value AS id"
                .to_string(),
        )
        .param("start", FIRST_ID - 1);

        let id: i64 = self
            .client
            .query_scalar(query, "id")
            .await?
            .ok_or_else(|| anyhow!("id sequence returned no value"))?;
        Ok(ElementId(id as u64))
    }

    async fn find_id(&self, query: Query) -> RepositoryResult<Option<ElementId>> {
        let id: Option<i64> = self.client.query_scalar(query, "id").await?;
        Ok(id.map(|v| ElementId(v as u64)))
    }

    async fn link_element(&self, props: &ElementProps, id: ElementId) -> RepositoryResult<()> {
        let clear = Query::new(
            "MATCH (e:Element {id: $id})
             OPTIONAL MATCH (e)-[n:NAVIGATES|IN_CATEGORY]->()
             DELETE n"
                .to_string(),
        )
        .param("id", id.0 as i64);
        self.client.execute(clear).await?;

        if let Some(category) = props.category {
            let query = Query::new(
                "MATCH (e:Element {id: $id}), (c:Category {id: $category})
                 MERGE (e)-[:IN_CATEGORY]->(c)"
                    .to_string(),
            )
            .param("id", id.0 as i64)
            .param("category", category.0 as i64);
            self.client.execute(query).await?;
        }

        for (name, related) in &props.related {
            let query = Query::new(
                "MATCH (e:Element {id: $id}), (t:Element {id: $target})
                 MERGE (e)-[:NAVIGATES {name: $name, class_name: $class_name}]->(t)"
                    .to_string(),
            )
            .param("id", id.0 as i64)
            .param("target", related.id.0 as i64)
            .param("name", name.as_str())
            .param("class_name", related.rel_class_name.as_str());
            self.client.execute(query).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Repository for Neo4jRepository {
    async fn ensure_code_spec(&self, name: &str) -> RepositoryResult<ElementId> {
        let find = Query::new("MATCH (c:CodeSpec {name: $name}) RETURN c.id AS id".to_string())
            .param("name", name);
        if let Some(id) = self.find_id(find).await? {
            return Ok(id);
        }

        let id = self.next_id().await?;
        let query = Query::new("CREATE (c:CodeSpec {id: $id, name: $name})".to_string())
            .param("id", id.0 as i64)
            .param("name", name);
        self.client.execute(query).await?;
        debug!(name, %id, "Created code spec");
        Ok(id)
    }

    async fn ensure_job_subject(&self, name: &str) -> RepositoryResult<ElementId> {
        let find = Query::new("MATCH (s:Subject {name: $name}) RETURN s.id AS id".to_string())
            .param("name", name);
        if let Some(id) = self.find_id(find).await? {
            return Ok(id);
        }

        let id = self.next_id().await?;
        let query = Query::new(
            "MERGE (r:Subject {name: $root})
             ON CREATE SET r.id = $root_id
             CREATE (s:Subject {id: $id, name: $name})-[:CHILD_OF]->(r)"
                .to_string(),
        )
        .param("root", ROOT_SUBJECT_NAME)
        .param("root_id", ElementId::ROOT_SUBJECT.0 as i64)
        .param("id", id.0 as i64)
        .param("name", name);
        self.client.execute(query).await?;
        debug!(name, %id, "Created job subject");
        Ok(id)
    }

    async fn find_model(&self, subject: ElementId, name: &str) -> RepositoryResult<Option<ElementId>> {
        let query = Query::new(
            "MATCH (m:Model {subject: $subject, name: $name}) RETURN m.id AS id".to_string(),
        )
        .param("subject", subject.0 as i64)
        .param("name", name);
        self.find_id(query).await
    }

    async fn insert_model(&self, subject: ElementId, name: &str, kind: ModelKind) -> RepositoryResult<ElementId> {
        let id = self.next_id().await?;
        let query = Query::new(
            "MATCH (s:Subject {id: $subject})
             CREATE (m:Model {id: $id, subject: $subject, name: $name,
                              partition_class: $partition_class, model_class: $model_class})-[:UNDER]->(s)"
                .to_string(),
        )
        .param("subject", subject.0 as i64)
        .param("id", id.0 as i64)
        .param("name", name)
        .param("partition_class", kind.partition_class())
        .param("model_class", kind.model_class());
        self.client.execute(query).await?;
        Ok(id)
    }

    async fn find_category(&self, model: ElementId, name: &str) -> RepositoryResult<Option<ElementId>> {
        let query = Query::new(
            "MATCH (c:Category {model: $model, name: $name}) RETURN c.id AS id".to_string(),
        )
        .param("model", model.0 as i64)
        .param("name", name);
        self.find_id(query).await
    }

    async fn insert_category(&self, model: ElementId, name: &str, kind: CategoryKind) -> RepositoryResult<ElementId> {
        let id = self.next_id().await?;
        let query = Query::new(
            "MATCH (m:Model {id: $model})
             CREATE (c:Category {id: $id, model: $model, name: $name, class_name: $class_name})-[:IN_MODEL]->(m)"
                .to_string(),
        )
        .param("model", model.0 as i64)
        .param("id", id.0 as i64)
        .param("name", name)
        .param("class_name", kind.class_name());
        self.client.execute(query).await?;
        Ok(id)
    }

    async fn find_element(&self, code: &Code) -> RepositoryResult<Option<ElementId>> {
        let query = Query::new(
            "MATCH (e:Element {code_spec: $spec, code_scope: $scope, code_value: $value})
             RETURN e.id AS id"
                .to_string(),
        )
        .param("spec", code.spec.0 as i64)
        .param("scope", code.scope.0 as i64)
        .param("value", code.value.as_str());
        self.find_id(query).await
    }

    async fn get_element(&self, id: ElementId) -> RepositoryResult<ElementProps> {
        let query = Query::new("MATCH (e:Element {id: $id}) RETURN e.data AS data".to_string())
            .param("id", id.0 as i64);
        let data: String = self
            .client
            .query_scalar(query, "data")
            .await?
            .ok_or(RepositoryError::ElementNotFound(id))?;
        Ok(serde_json::from_str(&data)?)
    }

    async fn insert_element(&self, props: &ElementProps) -> RepositoryResult<ElementId> {
        if self.find_element(&props.code).await?.is_some() {
            return Err(RepositoryError::DuplicateCode(props.code.to_string()));
        }

        let id = self.next_id().await?;
        let mut stored = props.clone();
        stored.id = Some(id);

        let query = Query::new(
            "MATCH (m:Model {id: $model})
             CREATE (e:Element {id: $id, class_name: $class_name, model: $model,
                                code_spec: $spec, code_scope: $scope, code_value: $value,
                                user_label: $label, data: $data})-[:IN_MODEL]->(m)"
                .to_string(),
        )
        .param("model", props.model.0 as i64)
        .param("id", id.0 as i64)
        .param("class_name", props.class_full_name.as_str())
        .param("spec", props.code.spec.0 as i64)
        .param("scope", props.code.scope.0 as i64)
        .param("value", props.code.value.as_str())
        .param("label", props.user_label.as_deref().unwrap_or(""))
        .param("data", serde_json::to_string(&stored)?);
        self.client.execute(query).await?;

        self.link_element(&stored, id).await?;
        Ok(id)
    }

    async fn update_element(&self, props: &ElementProps) -> RepositoryResult<()> {
        let id = props
            .id
            .ok_or_else(|| RepositoryError::MissingId(props.code.to_string()))?;

        if let Some(owner) = self.find_element(&props.code).await? {
            if owner != id {
                return Err(RepositoryError::DuplicateCode(props.code.to_string()));
            }
        }

        let query = Query::new(
            "MATCH (e:Element {id: $id})
             SET e.class_name = $class_name,
                 e.code_spec = $spec,
                 e.code_scope = $scope,
                 e.code_value = $value,
                 e.user_label = $label,
                 e.data = $data
             RETURN e.id AS id"
                .to_string(),
        )
        .param("id", id.0 as i64)
        .param("class_name", props.class_full_name.as_str())
        .param("spec", props.code.spec.0 as i64)
        .param("scope", props.code.scope.0 as i64)
        .param("value", props.code.value.as_str())
        .param("label", props.user_label.as_deref().unwrap_or(""))
        .param("data", serde_json::to_string(props)?);
        if self.find_id(query).await?.is_none() {
            return Err(RepositoryError::ElementNotFound(id));
        }

        self.link_element(props, id).await
    }

    async fn find_relationship(
        &self,
        class_full_name: &str,
        source: ElementId,
        target: ElementId,
    ) -> RepositoryResult<Option<ElementId>> {
        let query = Query::new(
            "MATCH (:Element {id: $source})-[r:RELATES {class_name: $class_name}]->(:Element {id: $target})
             RETURN r.id AS id"
                .to_string(),
        )
        .param("source", source.0 as i64)
        .param("target", target.0 as i64)
        .param("class_name", class_full_name);
        self.find_id(query).await
    }

    async fn insert_relationship(
        &self,
        class_full_name: &str,
        source: ElementId,
        target: ElementId,
    ) -> RepositoryResult<ElementId> {
        let id = self.next_id().await?;
        let query = Query::new(
            "MATCH (s:Element {id: $source}), (t:Element {id: $target})
             CREATE (s)-[r:RELATES {id: $id, class_name: $class_name}]->(t)
             RETURN r.id AS id"
                .to_string(),
        )
        .param("source", source.0 as i64)
        .param("target", target.0 as i64)
        .param("id", id.0 as i64)
        .param("class_name", class_full_name);

        self.find_id(query)
            .await?
            .ok_or(RepositoryError::ElementNotFound(source))
    }

    async fn project_extents(&self) -> RepositoryResult<Range3d> {
        let query = Query::new(
            "MATCH (x:ProjectExtents {name: 'project'})
             RETURN x.low_x AS low_x, x.low_y AS low_y, x.low_z AS low_z,
                    x.high_x AS high_x, x.high_y AS high_y, x.high_z AS high_z"
                .to_string(),
        );
        let rows = self.client.query(query).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(Range3d::null());
        };

        let get = |field: &str| -> RepositoryResult<f64> {
            row.get::<f64>(field)
                .map_err(|e| RepositoryError::Backend(anyhow!("Failed to get field '{}': {:?}", field, e)))
        };
        Ok(Range3d::new(
            Point3d::new(get("low_x")?, get("low_y")?, get("low_z")?),
            Point3d::new(get("high_x")?, get("high_y")?, get("high_z")?),
        ))
    }

    async fn update_project_extents(&self, extents: &Range3d) -> RepositoryResult<()> {
        if extents.is_null() {
            return Ok(());
        }
        let query = Query::new(
            "MERGE (x:ProjectExtents {name: 'project'})
             SET x.low_x = $low_x, x.low_y = $low_y, x.low_z = $low_z,
                 x.high_x = $high_x, x.high_y = $high_y, x.high_z = $high_z"
                .to_string(),
        )
        .param("low_x", extents.low.x)
        .param("low_y", extents.low.y)
        .param("low_z", extents.low.z)
        .param("high_x", extents.high.x)
        .param("high_y", extents.high.y)
        .param("high_z", extents.high.z);
        self.client.execute(query).await?;
        Ok(())
    }

    async fn import_schema(&self, name: &str, document: &str) -> RepositoryResult<()> {
        let query = Query::new(
            "MERGE (s:SchemaDocument {name: $name})
             SET s.document = $document, s.imported_at = $imported_at"
                .to_string(),
        )
        .param("name", name)
        .param("document", document)
        .param("imported_at", chrono::Utc::now().to_rfc3339());
        self.client.execute(query).await?;
        Ok(())
    }

    async fn schema_document(&self, name: &str) -> RepositoryResult<Option<String>> {
        let query = Query::new(
            "MATCH (s:SchemaDocument {name: $name}) RETURN s.document AS document".to_string(),
        )
        .param("name", name);
        Ok(self.client.query_scalar(query, "document").await?)
    }
}
