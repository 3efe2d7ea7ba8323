//! Filter stage of the report pipeline.

use crate::models::{ReportFilters, ReportRecord};

/// Keeps the records for which every present predicate matches.
///
/// A record lacking the compared field fails a present predicate.
pub fn apply_filters(records: Vec<ReportRecord>, filters: &ReportFilters) -> Vec<ReportRecord> {
    records
        .into_iter()
        .filter(|record| matches_filters(record, filters))
        .collect()
}

/// Whether a single record passes every present predicate.
pub fn matches_filters(record: &ReportRecord, filters: &ReportFilters) -> bool {
    in_set(record.status.as_deref(), filters.user_status.as_deref())
        && in_set(record.plan.as_deref(), filters.user_plans.as_deref())
        && in_set(record.kind.as_deref(), filters.record_types.as_deref())
        && within_bounds(record.revenue, filters.min_revenue, filters.max_revenue)
}

fn in_set(value: Option<&str>, allowed: Option<&[String]>) -> bool {
    match allowed {
        None | Some([]) => true,
        Some(allowed) => value.is_some_and(|v| allowed.iter().any(|a| a == v)),
    }
}

fn within_bounds(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}
