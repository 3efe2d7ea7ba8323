//! Domain models for Lexdesk reports.

pub mod comparison;
pub mod report;
pub mod template;

pub use comparison::{
    CompareReportsRequest, MetricComparison, PreviousPeriod, ReportComparison, Trend,
};
pub use report::{
    ChartData, ChartDataset, ChartType, DateRange, ExportFormat, GroupBy, GroupedBucket,
    ListReportsQuery, MetricSchema, ReportConfig, ReportData, ReportFilters, ReportFormat,
    ReportRecord, ReportRows, ReportSummary, ReportType, UpdateReportRequest,
};
pub use template::ReportTemplate;
