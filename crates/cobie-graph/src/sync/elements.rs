//! Element class alignment: one element per source row.

use tracing::{debug, warn};

use cobie_core::{
    Code, ElementClassDescriptor, ElementClassNode, ElementId, FieldValue, ItemState,
    Placement3d, Point3d, PrimitiveType, Row, TypeDefinitionSpec,
};
use cobie_schema::{column_name, EntityClassDef};
use cobie_source::primary_key_column;

use super::{AlignmentEngine, SyncResult, SyncSession};
use crate::error::SyncError;
use crate::repository::{ElementProps, RelatedElement};
use crate::tracker::SourceItem;

/// Navigation property linking an element to its type element.
pub const TYPE_DEFINITION_NAVIGATION: &str = "typeDefinition";
const TYPE_DEFINITION_RELATIONSHIP: &str = "BisCore:PhysicalElementIsOfType";

const COORDINATE_KEY: &str = "Coordinate.id";
const COORDINATE_AXES: [&str; 3] = [
    "Coordinate.coordinatexaxis",
    "Coordinate.coordinateyaxis",
    "Coordinate.coordinatezaxis",
];

impl AlignmentEngine<'_> {
    /// Write every new or changed row of the node's table.
    pub(crate) async fn update_element_class(
        &self,
        session: &mut SyncSession,
        model_id: ElementId,
        node: &ElementClassNode,
    ) -> Result<SyncResult, SyncError> {
        let class = self.registry.element_class(&node.class)?;
        let entity = self.schema.entity_class(&class.name).ok_or_else(|| {
            SyncError::config(format!("schema has no entity class for '{}'", class.name))
        })?;
        let category = node
            .category
            .as_deref()
            .map(|name| session.category(name))
            .transpose()?;

        let table = class.table.as_str();
        let key_field = format!("{}.{}", table, primary_key_column(table));
        let rows = self.reader.fetch_rows(table)?;
        let mut result = SyncResult::default();

        for row in &rows {
            let Some(key) = row.get(&key_field).as_key() else {
                warn!(table, field = %key_field, "Row without primary key value skipped");
                result.rows_skipped += 1;
                continue;
            };
            let code_value = Code::value_for(table, &key);
            let checksum = row
                .checksum()
                .map_err(|e| SyncError::data(table, &code_value, e.to_string()))?;
            let item = SourceItem::new(model_id, table, &code_value, checksum);
            let change = self.tracker.detect_changes(&item)?;

            if change.state == ItemState::Unchanged {
                self.tracker.mark_seen(&session.run_id, &item)?;
                let code = Code::new(session.code_spec, model_id, code_value.clone());
                let id = match change.element_id {
                    Some(id) => Some(id),
                    None => self.repo.find_element(&code).await?,
                };
                if let Some(id) = id {
                    session.element_cache.insert((model_id, code_value), id);
                }
                result.elements_unchanged += 1;
                continue;
            }

            let mut props = self.build_props(session, model_id, class, entity, category, row, &code_value)?;
            if let Some(type_def) = &node.type_definition {
                if let Some(related) = self.resolve_type_definition(session, type_def, row).await? {
                    props.related.insert(TYPE_DEFINITION_NAVIGATION.to_string(), related);
                }
            }

            let id = match self.repo.find_element(&props.code).await? {
                Some(id) => {
                    // Links set by relationship classes survive a rebuilt row.
                    // The type link belongs to the row and is never carried over.
                    let stored = self.repo.get_element(id).await?;
                    for (name, related) in stored.related {
                        if node.type_definition.is_some() && name == TYPE_DEFINITION_NAVIGATION {
                            continue;
                        }
                        props.related.entry(name).or_insert(related);
                    }
                    props.id = Some(id);
                    self.repo.update_element(&props).await?;
                    result.elements_updated += 1;
                    id
                }
                None => {
                    let id = self.repo.insert_element(&props).await?;
                    result.elements_inserted += 1;
                    id
                }
            };

            // Extents must be stored before the row is recorded as synced.
            if let Some(placement) = &props.placement {
                let range = placement.calculate_range();
                if !session.extents.contains_range(&range) {
                    session.extents.extend_range(&range);
                    self.repo.update_project_extents(&session.extents).await?;
                }
            }

            self.tracker.record(&session.run_id, &item, id)?;
            debug!(table, code = %code_value, state = %change.state, %id, "Aligned element");
            session.element_cache.insert((model_id, code_value), id);
        }

        let stale = self.tracker.unseen(&session.run_id, model_id, table)?;
        if !stale.is_empty() {
            warn!(
                table,
                count = stale.len(),
                first = %stale[0],
                "Tracked elements no longer present in source"
            );
            result.stale_elements += stale.len();
        }

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_props(
        &self,
        session: &SyncSession,
        model_id: ElementId,
        class: &ElementClassDescriptor,
        entity: &EntityClassDef,
        category: Option<ElementId>,
        row: &Row,
        code_value: &str,
    ) -> Result<ElementProps, SyncError> {
        let table = class.table.as_str();
        let coerce = |value: &FieldValue, ty: PrimitiveType| {
            value
                .coerce(ty)
                .map_err(|e| SyncError::data(table, code_value, e.to_string()))
        };

        let code = Code::new(session.code_spec, model_id, code_value);
        let mut props = ElementProps::new(self.schema.full_name(&entity.name), model_id, code);
        props.user_label = row.get(&class.label_field()).as_key();
        props.category = category;

        for property in &entity.properties {
            let field = format!("{}.{}", table, column_name(&property.name));
            let value = coerce(row.get(&field), property.primitive)?;
            props.properties.insert(property.name.clone(), value);
        }
        for derived in &class.derived {
            let value = coerce(row.get(&derived.field), derived.primitive)?;
            props.properties.insert(derived.property.clone(), value);
        }

        if class.kind.is_geometric() {
            props.placement = Some(self.placement_for(row, table, code_value)?);
        }

        Ok(props)
    }

    /// Origin from the joined coordinate row when present, else the origin.
    fn placement_for(&self, row: &Row, table: &str, code_value: &str) -> Result<Placement3d, SyncError> {
        if row.get(COORDINATE_KEY).is_null() {
            return Ok(Placement3d::default());
        }

        let mut axes = [0.0; 3];
        for (slot, field) in axes.iter_mut().zip(COORDINATE_AXES) {
            let value = row
                .get(field)
                .coerce(PrimitiveType::Double)
                .map_err(|e| SyncError::data(table, code_value, e.to_string()))?;
            *slot = value.as_f64().unwrap_or(0.0);
        }
        Ok(Placement3d::at(Point3d::new(axes[0], axes[1], axes[2])))
    }

    async fn resolve_type_definition(
        &self,
        session: &mut SyncSession,
        spec: &TypeDefinitionSpec,
        row: &Row,
    ) -> Result<Option<RelatedElement>, SyncError> {
        let Some(key) = row.get(&spec.key).as_key() else {
            return Ok(None);
        };
        let type_class = self.registry.element_class(&spec.class)?;
        let type_model = session.model(&spec.model)?;

        let found = self
            .resolve_element(session, type_model, &type_class.table, &key)
            .await?;
        if found.is_none() {
            debug!(class = %spec.class, key = %key, "Type element not found");
        }
        Ok(found.map(|id| RelatedElement::new(id, TYPE_DEFINITION_RELATIONSHIP)))
    }

    /// Element for `(model, table, key)`, from the session cache or the
    /// repository.
    pub(crate) async fn resolve_element(
        &self,
        session: &mut SyncSession,
        model_id: ElementId,
        table: &str,
        key: &str,
    ) -> Result<Option<ElementId>, SyncError> {
        let value = Code::value_for(table, key);
        if let Some(id) = session.element_cache.get(&(model_id, value.clone())) {
            return Ok(Some(*id));
        }

        let code = Code::new(session.code_spec, model_id, value.clone());
        let found = self.repo.find_element(&code).await?;
        if let Some(id) = found {
            session.element_cache.insert((model_id, value), id);
        }
        Ok(found)
    }
}

/// Keys listed in a (possibly multi-valued) endpoint field.
pub(crate) fn split_keys(value: &FieldValue, separator: Option<char>) -> Vec<String> {
    let Some(raw) = value.as_key() else {
        return Vec::new();
    };
    match separator {
        Some(sep) => raw
            .split(sep)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
        None => vec![raw],
    }
}
