//! Report repository.
//!
//! Stores generated reports through the remote API, falling back to the
//! local `advanced_reports` blob.

use domain::models::{ListReportsQuery, ReportData, UpdateReportRequest};
use shared::pagination::Page;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::local_store::{LocalStore, REPORTS_KEY};
use crate::remote::RemoteReportApi;
use crate::resilient::ResilientExecutor;

/// Repository for generated reports.
#[derive(Clone)]
pub struct ReportRepository {
    remote: Option<Arc<dyn RemoteReportApi>>,
    local: Arc<LocalStore>,
    executor: Arc<ResilientExecutor>,
}

impl ReportRepository {
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

    /// Persists a report, replacing any stored report with the same id.
    pub async fn save(&self, report: ReportData) -> Result<ReportData, StoreError> {
        let local_copy = report.clone();
        self.executor
            .run(
                "save_report",
                || async {
                    let saved = self.remote()?.create_report(&report).await?;
                    self.mirror(saved.clone()).await;
                    Ok(saved)
                },
                || async move {
                    self.upsert_local(local_copy.clone()).await?;
                    Ok(local_copy)
                },
            )
            .await
    }

    pub async fn list(&self, query: &ListReportsQuery) -> Result<Page<ReportData>, StoreError> {
        self.executor
            .run(
                "list_reports",
                || async { self.remote()?.list_reports(query).await },
                || async {
                    let mut reports: Vec<ReportData> = self.local.load(REPORTS_KEY).await;
                    reports.retain(|r| query.matches(r));
                    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                    Ok(query.page_query().paginate(reports))
                },
            )
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<ReportData, StoreError> {
        self.executor
            .run(
                "get_report",
                || async { self.remote()?.get_report(id).await },
                || async {
                    let reports: Vec<ReportData> = self.local.load(REPORTS_KEY).await;
                    reports
                        .into_iter()
                        .find(|r| r.id == id)
                        .ok_or_else(|| StoreError::NotFound(format!("report {}", id)))
                },
            )
            .await
    }

    /// Updates report metadata. Generated content is left untouched.
    pub async fn update(
        &self,
        id: Uuid,
        update: &UpdateReportRequest,
    ) -> Result<ReportData, StoreError> {
        self.executor
            .run(
                "update_report",
                || async {
                    let updated = self.remote()?.update_report(id, update).await?;
                    self.mirror(updated.clone()).await;
                    Ok(updated)
                },
                || async {
                    self.local
                        .update(REPORTS_KEY, |reports: &mut Vec<ReportData>| {
                            let report = reports.iter_mut().find(|r| r.id == id)?;
                            update.apply_to(report);
                            Some(report.clone())
                        })
                        .await?
                        .ok_or_else(|| StoreError::NotFound(format!("report {}", id)))
                },
            )
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.executor
            .run(
                "delete_report",
                || async {
                    self.remote()?.delete_report(id).await?;
                    if let Err(e) = self.remove_local(id).await {
                        tracing::debug!(report_id = %id, error = %e, "Local mirror delete skipped");
                    }
                    Ok(())
                },
                || async { self.remove_local(id).await },
            )
            .await
    }

    /// Asks the remote API to regenerate a report.
    ///
    /// Returns `None` when the remote is not in use; the caller then re-runs
    /// the pipeline itself.
    pub async fn regenerate(&self, id: Uuid) -> Result<Option<ReportData>, StoreError> {
        self.executor
            .run(
                "regenerate_report",
                || async {
                    let report = self.remote()?.regenerate_report(id).await?;
                    self.mirror(report.clone()).await;
                    Ok(Some(report))
                },
                || async { Ok(None) },
            )
            .await
    }

    /// Best-effort copy of a remote result into the local blob.
    async fn mirror(&self, report: ReportData) {
        let id = report.id;
        if let Err(e) = self.upsert_local(report).await {
            tracing::warn!(report_id = %id, error = %e, "Failed to mirror report locally");
        }
    }

    async fn upsert_local(&self, report: ReportData) -> Result<(), StoreError> {
        self.local
            .update(REPORTS_KEY, |reports: &mut Vec<ReportData>| {
                match reports.iter().position(|r| r.id == report.id) {
                    Some(index) => reports[index] = report,
                    None => reports.insert(0, report),
                }
            })
            .await
    }

    async fn remove_local(&self, id: Uuid) -> Result<(), StoreError> {
        let removed = self
            .local
            .update(REPORTS_KEY, |reports: &mut Vec<ReportData>| {
                let before = reports.len();
                reports.retain(|r| r.id != id);
                before != reports.len()
            })
            .await?;

        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("report {}", id)))
        }
    }
}
