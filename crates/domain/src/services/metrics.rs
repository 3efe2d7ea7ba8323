//! Metric calculator.

use std::collections::BTreeMap;

use crate::models::{ReportRecord, ReportType};

pub const TOTAL_RECORDS: &str = "totalRecords";
pub const TOTAL_REVENUE: &str = "totalRevenue";
pub const AVERAGE_REVENUE: &str = "averageRevenue";
pub const TOTAL_CREDITS: &str = "totalCredits";
pub const AVERAGE_CREDITS: &str = "averageCredits";

/// Reduces flat records to `(total_records, key_metrics)`.
///
/// The metric set comes from the report type's schema. An empty record set
/// yields an empty map.
pub fn calculate_metrics(
    records: &[ReportRecord],
    report_type: ReportType,
) -> (usize, BTreeMap<String, f64>) {
    let total = records.len();
    let mut metrics = BTreeMap::new();
    if total == 0 {
        return (0, metrics);
    }

    let count = total as f64;
    metrics.insert(TOTAL_RECORDS.to_string(), count);

    let schema = report_type.metric_schema();
    if schema.revenue {
        let sum: f64 = records.iter().map(|r| r.revenue.unwrap_or(0.0)).sum();
        metrics.insert(TOTAL_REVENUE.to_string(), sum);
        metrics.insert(AVERAGE_REVENUE.to_string(), sum / count);
    }
    if schema.credits {
        let sum: f64 = records.iter().map(|r| r.credits.unwrap_or(0.0)).sum();
        metrics.insert(TOTAL_CREDITS.to_string(), sum);
        metrics.insert(AVERAGE_CREDITS.to_string(), sum / count);
    }

    (total, metrics)
}
