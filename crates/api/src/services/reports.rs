//! Report service.
//!
//! Runs the generation pipeline (validate, collect, filter, group, metrics,
//! charts, assemble) and fronts the report and template repositories.

use chrono::Utc;
use domain::models::{
    CompareReportsRequest, ExportFormat, ListReportsQuery, ReportComparison, ReportConfig,
    ReportData, ReportRows, ReportSummary, ReportTemplate, UpdateReportRequest,
};
use domain::services::{
    apply_filters, calculate_metrics, compare_summaries, export_report, group_records,
    previous_range, project_charts, CollectError, DataCollector, ExportError, ExportedFile,
};
use metrics::counter;
use persistence::repositories::{ReportRepository, TemplateRepository};
use persistence::StoreError;
use shared::pagination::Page;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Report service errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Data collection failed: {0}")]
    Collect(#[from] CollectError),

    #[error("Report store error: {0}")]
    Store(StoreError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl From<StoreError> for ReportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ReportError::NotFound(what),
            other => ReportError::Store(other),
        }
    }
}

/// Report generation and storage service, shared through `AppState`.
pub struct ReportService {
    collector: Arc<dyn DataCollector>,
    reports: ReportRepository,
    templates: TemplateRepository,
}

impl ReportService {
    pub fn new(
        collector: Arc<dyn DataCollector>,
        reports: ReportRepository,
        templates: TemplateRepository,
    ) -> Self {
        Self {
            collector,
            reports,
            templates,
        }
    }

    /// Runs the pipeline without persisting the result.
    pub async fn build(&self, config: ReportConfig) -> Result<ReportData, ReportError> {
        self.assemble(config, Uuid::new_v4()).await
    }

    /// Builds a report and persists it.
    pub async fn generate(&self, config: ReportConfig) -> Result<ReportData, ReportError> {
        let report = self.build(config).await?;
        let saved = self.reports.save(report).await?;

        counter!("reports_generated_total", "type" => saved.config.report_type.as_str())
            .increment(1);
        info!(
            report_id = %saved.id,
            report_type = %saved.config.report_type,
            total_records = saved.summary.total_records,
            "Report generated"
        );

        Ok(saved)
    }

    /// Builds the current report and one over the derived previous period.
    /// Neither is persisted.
    pub async fn compare(
        &self,
        request: CompareReportsRequest,
    ) -> Result<ReportComparison, ReportError> {
        request.validate()?;

        let CompareReportsRequest {
            config,
            previous_period,
        } = request;
        let previous_config = ReportConfig {
            date_range: previous_range(&config.date_range, previous_period),
            ..config.clone()
        };

        let current = self.build(config).await?;
        let previous = self.build(previous_config).await?;
        let comparison = compare_summaries(&current.summary, &previous.summary);

        Ok(ReportComparison {
            current,
            previous,
            comparison,
        })
    }

    /// Regenerates a stored report.
    ///
    /// The remote API does the work when available. Otherwise the pipeline
    /// re-runs over the stored config and the result keeps the original id.
    pub async fn regenerate(&self, id: Uuid) -> Result<ReportData, ReportError> {
        if let Some(report) = self.reports.regenerate(id).await? {
            return Ok(report);
        }

        let existing = self.reports.get(id).await?;
        let mut rebuilt = self.assemble(existing.config, id).await?;
        rebuilt.scheduled = existing.scheduled;

        info!(report_id = %id, "Report regenerated locally");
        Ok(self.reports.save(rebuilt).await?)
    }

    pub async fn list(&self, query: &ListReportsQuery) -> Result<Page<ReportData>, ReportError> {
        Ok(self.reports.list(query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<ReportData, ReportError> {
        Ok(self.reports.get(id).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: UpdateReportRequest,
    ) -> Result<ReportData, ReportError> {
        update.validate()?;
        Ok(self.reports.update(id, &update).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ReportError> {
        Ok(self.reports.delete(id).await?)
    }

    pub async fn export(&self, id: Uuid, format: ExportFormat) -> Result<ExportedFile, ReportError> {
        let report = self.reports.get(id).await?;
        let file = export_report(&report, format)?;

        counter!("reports_exported_total", "format" => format.extension()).increment(1);
        info!(report_id = %id, file_name = %file.file_name, "Report exported");

        Ok(file)
    }

    pub async fn list_templates(&self) -> Result<Vec<ReportTemplate>, ReportError> {
        Ok(self.templates.list().await?)
    }

    pub async fn save_template(&self, config: ReportConfig) -> Result<ReportTemplate, ReportError> {
        config.validate()?;
        Ok(self.templates.save(ReportTemplate::from_config(config)).await?)
    }

    /// Returns a fresh working config copied from a template.
    pub async fn apply_template(&self, id: Uuid) -> Result<ReportConfig, ReportError> {
        Ok(self.templates.find(id).await?.apply())
    }

    pub async fn delete_template(&self, id: Uuid) -> Result<(), ReportError> {
        Ok(self.templates.delete(id).await?)
    }

    async fn assemble(&self, config: ReportConfig, id: Uuid) -> Result<ReportData, ReportError> {
        config.validate()?;

        let collected = self
            .collector
            .collect(config.report_type, &config.date_range)
            .await?;
        let records = apply_filters(collected, &config.filters);
        let (total_records, key_metrics) = calculate_metrics(&records, config.report_type);

        let data = match group_records(records.clone(), config.group_by) {
            Some(buckets) => ReportRows::Grouped(buckets),
            None => ReportRows::Flat(records.clone()),
        };
        let charts = project_charts(&data, &records, &config);

        let now = Utc::now();
        Ok(ReportData {
            id,
            summary: ReportSummary {
                total_records,
                generated_at: now,
                time_range: config.date_range.describe(),
                key_metrics,
            },
            config,
            data,
            charts,
            scheduled: false,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use domain::models::{
        DateRange, GroupBy, PreviousPeriod, ReportFormat, ReportRecord, ReportType, Trend,
    };
    use domain::services::InMemoryCollector;
    use persistence::local_store::LocalStore;
    use persistence::resilient::ResilientExecutor;
    use tempfile::TempDir;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    fn user(id: &str, status: &str, revenue: f64, created_at: DateTime<Utc>) -> ReportRecord {
        ReportRecord {
            id: Some(id.to_string()),
            status: Some(status.to_string()),
            revenue: Some(revenue),
            created_at: Some(created_at),
            kind: Some("user".to_string()),
            ..Default::default()
        }
    }

    fn seeded() -> InMemoryCollector {
        InMemoryCollector::new().with_records(
            ReportType::Users,
            vec![
                user("u1", "active", 100.0, at(1, 15)),
                user("u2", "inactive", 50.0, at(2, 10)),
                user("u3", "active", 200.0, at(3, 20)),
            ],
        )
    }

    fn service(collector: InMemoryCollector) -> (ReportService, TempDir) {
        let dir = TempDir::new().unwrap();
        let local = Arc::new(LocalStore::new(dir.path()));
        let executor = Arc::new(ResilientExecutor::local_only());
        let service = ReportService::new(
            Arc::new(collector),
            ReportRepository::new(None, local.clone(), executor.clone()),
            TemplateRepository::new(None, local, executor),
        );
        (service, dir)
    }

    fn first_quarter(name: &str) -> ReportConfig {
        ReportConfig::new(name, ReportType::Users, DateRange::new(at(1, 1), at(3, 31)))
    }

    #[tokio::test]
    async fn test_generate_applies_filters_and_metrics() {
        let (service, _dir) = service(seeded());
        let mut config = first_quarter("Clientes ativos");
        config.filters.user_status = Some(vec!["active".to_string()]);

        let report = service.generate(config).await.unwrap();

        assert_eq!(report.summary.total_records, 2);
        assert_eq!(report.summary.key_metrics["totalRecords"], 2.0);
        assert_eq!(report.summary.key_metrics["totalRevenue"], 300.0);
        assert_eq!(report.summary.key_metrics["averageRevenue"], 150.0);
        assert_eq!(report.summary.time_range, "01/01/2024 - 31/03/2024");
        assert!(report.charts.is_none());

        let stored = service.get(report.id).await.unwrap();
        assert_eq!(stored, report);
    }

    #[tokio::test]
    async fn test_generate_grouped_chart_report() {
        let (service, _dir) = service(seeded());
        let mut config = first_quarter("Clientes por mês");
        config.group_by = GroupBy::Month;
        config.format = ReportFormat::Chart;

        let report = service.build(config).await.unwrap();

        match &report.data {
            ReportRows::Grouped(buckets) => {
                let periods: Vec<_> = buckets.iter().map(|b| b.period.as_str()).collect();
                assert_eq!(periods, vec!["2024-1", "2024-2", "2024-3"]);
            }
            other => panic!("expected grouped rows, got {:?}", other),
        }
        assert_eq!(report.charts.as_ref().map(Vec::len), Some(2));
        assert_eq!(report.summary.total_records, 3);
    }

    #[tokio::test]
    async fn test_validation_runs_before_collection() {
        let (service, _dir) = service(InMemoryCollector::failing());

        let result = service.generate(first_quarter("   ")).await;

        assert!(matches!(result, Err(ReportError::Validation(_))));
    }

    #[tokio::test]
    async fn test_collect_failure_is_reported() {
        let (service, _dir) = service(InMemoryCollector::failing());

        let result = service.generate(first_quarter("Clientes")).await;

        assert!(matches!(result, Err(ReportError::Collect(_))));
    }

    #[tokio::test]
    async fn test_empty_report_has_no_key_metrics() {
        let (service, _dir) = service(InMemoryCollector::new());

        let report = service.build(first_quarter("Vazio")).await.unwrap();

        assert_eq!(report.summary.total_records, 0);
        assert!(report.summary.key_metrics.is_empty());
        assert!(report.data.is_empty());
    }

    #[tokio::test]
    async fn test_regenerate_locally_keeps_id() {
        let (service, _dir) = service(seeded());
        let original = service.generate(first_quarter("Clientes")).await.unwrap();

        let regenerated = service.regenerate(original.id).await.unwrap();

        assert_eq!(regenerated.id, original.id);
        assert_eq!(regenerated.summary.total_records, 3);
        let page = service.list(&ListReportsQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_regenerate_unknown_report() {
        let (service, _dir) = service(seeded());

        let result = service.regenerate(Uuid::new_v4()).await;

        assert!(matches!(result, Err(ReportError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_compare_identical_periods_is_stable() {
        let undated = ReportRecord {
            id: Some("u9".to_string()),
            revenue: Some(80.0),
            ..Default::default()
        };
        let collector = InMemoryCollector::new().with_records(ReportType::Users, vec![undated]);
        let (service, _dir) = service(collector);

        let comparison = service
            .compare(CompareReportsRequest {
                config: first_quarter("Comparativo"),
                previous_period: PreviousPeriod::LastQuarter,
            })
            .await
            .unwrap();

        assert_eq!(comparison.previous.summary.time_range, "01/10/2023 - 31/12/2023");
        assert!(!comparison.comparison.is_empty());
        for metric in comparison.comparison.values() {
            assert_eq!(metric.change, 0.0);
            assert_eq!(metric.trend, Trend::Stable);
        }

        let page = service.list(&ListReportsQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_compare_detects_growth() {
        let (service, _dir) = service(seeded());

        let comparison = service
            .compare(CompareReportsRequest {
                config: ReportConfig::new(
                    "Fevereiro",
                    ReportType::Users,
                    DateRange::new(at(2, 1), at(3, 31)),
                ),
                previous_period: PreviousPeriod::Previous,
            })
            .await
            .unwrap();

        let total = &comparison.comparison["totalRecords"];
        assert_eq!(total.current, 2.0);
        assert_eq!(total.previous, 1.0);
        assert_eq!(total.trend, Trend::Up);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (service, _dir) = service(seeded());
        let report = service.generate(first_quarter("Clientes")).await.unwrap();

        let updated = service
            .update(
                report.id,
                UpdateReportRequest {
                    name: Some("Clientes Q1".to_string()),
                    description: None,
                    scheduled: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.config.name, "Clientes Q1");
        assert!(updated.scheduled);
        assert_eq!(updated.summary, report.summary);

        service.delete(report.id).await.unwrap();
        assert!(matches!(
            service.get(report.id).await,
            Err(ReportError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(report.id).await,
            Err(ReportError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (service, _dir) = service(seeded());
        let report = service.generate(first_quarter("Clientes Q1")).await.unwrap();

        let file = service.export(report.id, ExportFormat::Csv).await.unwrap();

        assert_eq!(file.content_type, "text/csv;charset=utf-8;");
        assert!(file.file_name.starts_with("clientes_q1_"));
        assert!(file.file_name.ends_with(".csv"));
        let text = String::from_utf8(file.bytes).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_template_lifecycle() {
        let (service, _dir) = service(seeded());
        let mut config = first_quarter("Modelo mensal");
        config.group_by = GroupBy::Month;

        let template = service.save_template(config.clone()).await.unwrap();
        assert_eq!(service.list_templates().await.unwrap(), vec![template.clone()]);

        let applied = service.apply_template(template.id).await.unwrap();
        assert_ne!(applied.id, template.id);
        assert_eq!(applied.name, config.name);
        assert_eq!(applied.group_by, GroupBy::Month);

        service.delete_template(template.id).await.unwrap();
        assert!(service.list_templates().await.unwrap().is_empty());
        assert!(matches!(
            service.apply_template(template.id).await,
            Err(ReportError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_template_validates_config() {
        let (service, _dir) = service(seeded());

        let result = service.save_template(first_quarter("")).await;

        assert!(matches!(result, Err(ReportError::Validation(_))));
    }
}
