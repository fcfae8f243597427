//! Model and category resolution.

use tracing::debug;

use cobie_core::{ElementId, ModelNode};

use super::{AlignmentEngine, SyncResult, SyncSession};
use crate::error::SyncError;

impl AlignmentEngine<'_> {
    /// Look the model up under the job subject, creating it on first sight.
    pub(crate) async fn resolve_or_create_model(
        &self,
        session: &mut SyncSession,
        model: &ModelNode,
        result: &mut SyncResult,
    ) -> Result<ElementId, SyncError> {
        if let Some(id) = session.model_cache.get(&model.name) {
            return Ok(*id);
        }

        let id = match self.repo.find_model(session.job_subject, &model.name).await? {
            Some(id) => id,
            None => {
                let id = self
                    .repo
                    .insert_model(session.job_subject, &model.name, model.kind)
                    .await?;
                result.models_created += 1;
                debug!(model = %model.name, %id, "Created model");
                id
            }
        };

        session.model_cache.insert(model.name.clone(), id);
        Ok(id)
    }

    /// Resolve every category declared in `model`.
    pub(crate) async fn resolve_or_create_categories(
        &self,
        session: &mut SyncSession,
        model: &ModelNode,
        model_id: ElementId,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        for category in model.categories() {
            if session.category_cache.contains_key(&category.name) {
                continue;
            }

            let id = match self.repo.find_category(model_id, &category.name).await? {
                Some(id) => id,
                None => {
                    let id = self
                        .repo
                        .insert_category(model_id, &category.name, category.kind)
                        .await?;
                    result.categories_created += 1;
                    debug!(category = %category.name, model = %model.name, %id, "Created category");
                    id
                }
            };

            session.category_cache.insert(category.name.clone(), id);
        }
        Ok(())
    }
}
