//! Relationship class alignment.

use tracing::debug;

use cobie_core::{MaterializationKind, RelationshipClassNode};

use super::elements::split_keys;
use super::{AlignmentEngine, SyncResult, SyncSession};
use crate::error::SyncError;
use crate::repository::RelatedElement;

impl AlignmentEngine<'_> {
    /// Materialize one relationship class from its backing table.
    pub(crate) async fn update_relationship_class(
        &self,
        session: &mut SyncSession,
        node: &RelationshipClassNode,
    ) -> Result<SyncResult, SyncError> {
        let rel = self.registry.relationship_class(&node.class)?;
        if self.schema.relationship_class(&rel.name).is_none() {
            return Err(SyncError::config(format!(
                "schema has no relationship class for '{}'",
                rel.name
            )));
        }
        let rel_full_name = self.schema.full_name(&rel.name);

        let source_model = session.model(&node.source.model)?;
        let target_model = session.model(&node.target.model)?;
        let source_table = self.registry.element_class(&node.source.class)?.table.clone();
        let target_table = self.registry.element_class(&node.target.class)?.table.clone();

        let rows = self.reader.fetch_rows(&rel.table)?;
        let mut result = SyncResult::default();

        for row in &rows {
            let source_keys = split_keys(row.get(&node.source.key), node.source.separator);
            let target_keys = split_keys(row.get(&node.target.key), node.target.separator);

            for source_key in &source_keys {
                let source = self
                    .resolve_element(session, source_model, &source_table, source_key)
                    .await?;

                for target_key in &target_keys {
                    let target = self
                        .resolve_element(session, target_model, &target_table, target_key)
                        .await?;

                    match &node.materialization {
                        MaterializationKind::LinkRecord => {
                            let (Some(source), Some(target)) = (source, target) else {
                                debug!(
                                    relationship = %rel.name,
                                    source = %source_key,
                                    target = %target_key,
                                    "Endpoint missing, link skipped"
                                );
                                continue;
                            };
                            if self
                                .repo
                                .find_relationship(&rel_full_name, source, target)
                                .await?
                                .is_some()
                            {
                                continue;
                            }
                            self.repo
                                .insert_relationship(&rel_full_name, source, target)
                                .await?;
                            result.relationships_created += 1;
                            debug!(relationship = %rel.name, %source, %target, "Created link");
                        }
                        MaterializationKind::EmbeddedOwnership { navigation } => {
                            let source = source.ok_or_else(|| {
                                SyncError::data(
                                    &rel.table,
                                    source_key,
                                    format!("{} element '{}' not found", node.source.class, source_key),
                                )
                            })?;
                            let target = target.ok_or_else(|| {
                                SyncError::data(
                                    &rel.table,
                                    target_key,
                                    format!("{} element '{}' not found", node.target.class, target_key),
                                )
                            })?;

                            let desired = RelatedElement::new(source, rel_full_name.clone());
                            let mut props = self.repo.get_element(target).await?;
                            if props.related.get(navigation) == Some(&desired) {
                                continue;
                            }
                            props.related.insert(navigation.clone(), desired);
                            self.repo.update_element(&props).await?;
                            result.relationships_updated += 1;
                            debug!(relationship = %rel.name, %source, %target, navigation = %navigation, "Set owner");
                        }
                    }
                }
            }
        }

        Ok(result)
    }
}
