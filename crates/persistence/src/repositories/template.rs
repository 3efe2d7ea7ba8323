//! Report template repository.

use domain::models::ReportTemplate;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::local_store::{LocalStore, TEMPLATES_KEY};
use crate::remote::RemoteReportApi;
use crate::resilient::ResilientExecutor;

/// Repository for saved report templates.
#[derive(Clone)]
pub struct TemplateRepository {
    remote: Option<Arc<dyn RemoteReportApi>>,
    local: Arc<LocalStore>,
    executor: Arc<ResilientExecutor>,
}

impl TemplateRepository {
    pub fn new(
        remote: Option<Arc<dyn RemoteReportApi>>,
        local: Arc<LocalStore>,
        executor: Arc<ResilientExecutor>,
    ) -> Self {
        Self {
            remote,
            local,
            executor,
        }
    }

    fn remote(&self) -> Result<&Arc<dyn RemoteReportApi>, StoreError> {
        self.remote
            .as_ref()
            .ok_or_else(|| StoreError::RemoteUnavailable("no remote report API configured".into()))
    }

    pub async fn list(&self) -> Result<Vec<ReportTemplate>, StoreError> {
        self.executor
            .run(
                "list_templates",
                || async { self.remote()?.list_templates().await },
                || async { Ok(self.local.load::<ReportTemplate>(TEMPLATES_KEY).await) },
            )
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<ReportTemplate, StoreError> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("template {}", id)))
    }

    pub async fn save(&self, template: ReportTemplate) -> Result<ReportTemplate, StoreError> {
        let local_copy = template.clone();
        self.executor
            .run(
                "save_template",
                || async {
                    let saved = self.remote()?.create_template(&template).await?;
                    if let Err(e) = self.push_local(saved.clone()).await {
                        tracing::warn!(template_id = %saved.id, error = %e, "Failed to mirror template locally");
                    }
                    Ok(saved)
                },
                || async move {
                    self.push_local(local_copy.clone()).await?;
                    Ok(local_copy)
                },
            )
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.executor
            .run(
                "delete_template",
                || async {
                    self.remote()?.delete_template(id).await?;
                    if let Err(e) = self.remove_local(id).await {
                        tracing::debug!(template_id = %id, error = %e, "Local mirror delete skipped");
                    }
                    Ok(())
                },
                || async { self.remove_local(id).await },
            )
            .await
    }

    async fn push_local(&self, template: ReportTemplate) -> Result<(), StoreError> {
        self.local
            .update(TEMPLATES_KEY, |templates: &mut Vec<ReportTemplate>| {
                templates.retain(|t| t.id != template.id);
                templates.push(template);
            })
            .await
    }

    async fn remove_local(&self, id: Uuid) -> Result<(), StoreError> {
        let removed = self
            .local
            .update(TEMPLATES_KEY, |templates: &mut Vec<ReportTemplate>| {
                let before = templates.len();
                templates.retain(|t| t.id != id);
                before != templates.len()
            })
            .await?;

        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("template {}", id)))
        }
    }
}
