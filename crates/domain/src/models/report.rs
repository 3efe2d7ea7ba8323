//! Report domain models.
//!
//! A report is declared by a [`ReportConfig`], produced once as an immutable
//! [`ReportData`] and persisted as-is. Field names follow the camelCase
//! convention of the remote report API.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ============================================================================
// Enumerations
// ============================================================================

/// Domain a report draws its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Users,
    Financial,
    Activity,
    Analytics,
    Custom,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Users,
        ReportType::Financial,
        ReportType::Activity,
        ReportType::Analytics,
        ReportType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Users => "users",
            ReportType::Financial => "financial",
            ReportType::Activity => "activity",
            ReportType::Analytics => "analytics",
            ReportType::Custom => "custom",
        }
    }

    /// Metrics derivable from records of this type.
    pub fn metric_schema(&self) -> MetricSchema {
        match self {
            ReportType::Users | ReportType::Custom => MetricSchema {
                revenue: true,
                credits: true,
            },
            ReportType::Financial => MetricSchema {
                revenue: true,
                credits: false,
            },
            ReportType::Activity => MetricSchema {
                revenue: false,
                credits: false,
            },
            ReportType::Analytics => MetricSchema {
                revenue: false,
                credits: true,
            },
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared set of summary metrics for a report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSchema {
    pub revenue: bool,
    pub credits: bool,
}

/// Time granularity used to bucket records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    None,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Presentation style requested for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Table,
    Chart,
    Summary,
    Detailed,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Table => "table",
            ReportFormat::Chart => "chart",
            ReportFormat::Summary => "summary",
            ReportFormat::Detailed => "detailed",
        }
    }
}

/// File formats a report can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xls",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8;",
            ExportFormat::Excel => "application/vnd.ms-excel",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Json => "application/json",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Inclusive time window a report covers.
///
/// `from <= to` is not enforced; an inverted range simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }

    /// Human-readable label, e.g. `15/01/2024 - 31/03/2024`.
    pub fn describe(&self) -> String {
        format!(
            "{} - {}",
            self.from.format("%d/%m/%Y"),
            self.to.format("%d/%m/%Y")
        )
    }
}

/// Calendar years a report window may span.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Validates that both ends of a report window fall within years 1 to 9999.
fn validate_date_range(range: &DateRange) -> Result<(), ValidationError> {
    if SUPPORTED_YEARS.contains(&range.from.year()) && SUPPORTED_YEARS.contains(&range.to.year()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_range_out_of_bounds");
        err.message = Some("Dates must fall between years 1 and 9999".into());
        Err(err)
    }
}

/// Sparse record filter. An absent predicate places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_string_set"))]
    pub user_status: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_string_set"))]
    pub user_plans: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_string_set"))]
    pub record_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Revenue bounds must be non-negative"))]
    pub min_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Revenue bounds must be non-negative"))]
    pub max_revenue: Option<f64>,
}

/// User-declared intent for a report. Also the schema of a saved template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[validate(
        length(max = 255, message = "Name must be at most 255 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    #[validate(custom(function = "validate_date_range"))]
    pub date_range: DateRange,
    #[serde(default)]
    #[validate(nested)]
    pub filters: ReportFilters,
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_metric_names"))]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub export_formats: Vec<ExportFormat>,
}

impl ReportConfig {
    /// Minimal configuration with every optional part left at its default.
    pub fn new(name: impl Into<String>, report_type: ReportType, date_range: DateRange) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            report_type,
            date_range,
            filters: ReportFilters::default(),
            group_by: GroupBy::None,
            metrics: Vec::new(),
            format: ReportFormat::Table,
            export_formats: Vec::new(),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A raw entity as collected for a report.
///
/// Well-known fields used by filtering, grouping and metrics are typed; all
/// other fields are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ReportRecord {
    /// The instant used for grouping and date-range checks: `date`, falling
    /// back to `created_at`.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date.or(self.created_at)
    }
}

/// Records sharing one period label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedBucket {
    pub period: String,
    /// First day of the period; `None` for the bucket of undated records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    pub count: usize,
    pub items: Vec<ReportRecord>,
}

/// Processed report rows, either flat or bucketed by period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "rows", rename_all = "snake_case")]
pub enum ReportRows {
    Flat(Vec<ReportRecord>),
    Grouped(Vec<GroupedBucket>),
}

impl ReportRows {
    /// Number of top-level rows (records or buckets).
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Flat(records) => records.len(),
            ReportRows::Grouped(buckets) => buckets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, ReportRows::Grouped(_))
    }
}

// ============================================================================
// Generated report
// ============================================================================

/// Summary block attached to every generated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_records: usize,
    pub generated_at: DateTime<Utc>,
    pub time_range: String,
    pub key_metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Chart-ready series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// The immutable output of one report generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub id: Uuid,
    pub config: ReportConfig,
    pub data: ReportRows,
    pub summary: ReportSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<ChartData>>,
    #[serde(default)]
    pub scheduled: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Requests
// ============================================================================

/// Query parameters for listing stored reports.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListReportsQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(rename = "type", default)]
    pub report_type: Option<ReportType>,
    #[serde(default)]
    pub format: Option<ReportFormat>,
}

impl ListReportsQuery {
    pub fn page_query(&self) -> shared::pagination::PageQuery {
        shared::pagination::PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Whether a stored report passes the type/format constraints.
    pub fn matches(&self, report: &ReportData) -> bool {
        self.report_type
            .map_or(true, |t| report.config.report_type == t)
            && self.format.map_or(true, |f| report.config.format == f)
    }
}

/// Metadata update for a stored report. Generated content is never changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        length(max = 255, message = "Name must be at most 255 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<bool>,
}

impl UpdateReportRequest {
    pub fn apply_to(&self, report: &mut ReportData) {
        if let Some(name) = &self.name {
            report.config.name = name.clone();
        }
        if let Some(description) = &self.description {
            report.config.description = Some(description.clone());
        }
        if let Some(scheduled) = self.scheduled {
            report.scheduled = scheduled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn q1_2024() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap(),
        )
    }

    #[test]
    fn test_report_config_deserialize_minimal() {
        let json = r#"{
            "name": "Clientes ativos",
            "type": "users",
            "dateRange": {"from": "2024-01-01T00:00:00Z", "to": "2024-03-31T23:59:59Z"}
        }"#;
        let config: ReportConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.name, "Clientes ativos");
        assert_eq!(config.report_type, ReportType::Users);
        assert_eq!(config.group_by, GroupBy::None);
        assert_eq!(config.format, ReportFormat::Table);
        assert_eq!(config.filters, ReportFilters::default());
        assert!(config.metrics.is_empty());
    }

    #[test]
    fn test_report_config_validation_blank_name() {
        let config = ReportConfig::new("   ", ReportType::Users, q1_2024());
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_report_config_validation_nested_filters() {
        let mut config = ReportConfig::new("Receita", ReportType::Financial, q1_2024());
        config.filters.min_revenue = Some(-10.0);
        assert!(config.validate().is_err());

        config.filters.min_revenue = Some(10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_config_validation_date_range_years() {
        let json = r#"{
            "name": "Histórico",
            "type": "users",
            "dateRange": {"from": "-200000-01-01T00:00:00Z", "to": "+200000-01-01T00:00:00Z"}
        }"#;
        let config: ReportConfig = serde_json::from_str(json).unwrap();
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("date_range"));

        let edges = DateRange::new(
            Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap(),
        );
        assert!(ReportConfig::new("Histórico", ReportType::Users, edges)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_filters_serialize_sparse() {
        let filters = ReportFilters {
            user_status: Some(vec!["ativo".to_string()]),
            ..Default::default()
        };
        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(json, r#"{"userStatus":["ativo"]}"#);
    }

    #[test]
    fn test_report_record_keeps_unknown_fields() {
        let json = r#"{"id":"u1","status":"ativo","type":"login","email":"ana@lexdesk.app"}"#;
        let record: ReportRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.kind.as_deref(), Some("login"));
        assert_eq!(record.extra["email"], "ana@lexdesk.app");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["type"], "login");
        assert_eq!(back["email"], "ana@lexdesk.app");
    }

    #[test]
    fn test_report_record_timestamp_fallback() {
        let created = Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap();
        let record = ReportRecord {
            created_at: Some(created),
            ..Default::default()
        };
        assert_eq!(record.timestamp(), Some(created));
        assert_eq!(ReportRecord::default().timestamp(), None);
    }

    #[test]
    fn test_report_rows_tagged_shape() {
        let rows = ReportRows::Flat(vec![]);
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json["shape"], "flat");

        let back: ReportRows = serde_json::from_value(json).unwrap();
        assert_eq!(back, ReportRows::Flat(vec![]));
    }

    #[test]
    fn test_date_range_contains_is_inclusive() {
        let range = q1_2024();
        assert!(range.contains(range.from));
        assert!(range.contains(range.to));
        assert!(!range.contains(range.to + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_date_range_describe() {
        assert_eq!(q1_2024().describe(), "01/01/2024 - 31/03/2024");
    }

    #[test]
    fn test_export_format_metadata() {
        assert_eq!(ExportFormat::Excel.extension(), "xls");
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(ExportFormat::Csv.content_type(), "text/csv;charset=utf-8;");
    }

    #[test]
    fn test_metric_schema_per_type() {
        assert!(ReportType::Users.metric_schema().revenue);
        assert!(ReportType::Users.metric_schema().credits);
        assert!(!ReportType::Financial.metric_schema().credits);
        assert!(!ReportType::Activity.metric_schema().revenue);
        assert!(ReportType::Analytics.metric_schema().credits);
    }

    #[test]
    fn test_list_query_matches() {
        let query = ListReportsQuery {
            report_type: Some(ReportType::Financial),
            ..Default::default()
        };
        let config = ReportConfig::new("Receita", ReportType::Financial, q1_2024());
        let report = ReportData {
            id: config.id,
            config,
            data: ReportRows::Flat(vec![]),
            summary: ReportSummary {
                total_records: 0,
                generated_at: Utc::now(),
                time_range: String::new(),
                key_metrics: BTreeMap::new(),
            },
            charts: None,
            scheduled: false,
            created_at: Utc::now(),
        };
        assert!(query.matches(&report));
        assert!(!ListReportsQuery {
            report_type: Some(ReportType::Users),
            ..Default::default()
        }
        .matches(&report));
    }
}
