//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a metric name in a report configuration.
const MAX_METRIC_NAME_LENGTH: usize = 64;

/// Maximum number of metrics a single report may request.
const MAX_METRICS_PER_REPORT: usize = 50;

/// Validates that a string contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates the metric list of a report configuration.
/// - At most 50 entries
/// - Every entry non-blank and at most 64 characters
pub fn validate_metric_names(metrics: &[String]) -> Result<(), ValidationError> {
    if metrics.len() > MAX_METRICS_PER_REPORT {
        let mut err = ValidationError::new("too_many_metrics");
        err.message = Some("A report cannot request more than 50 metrics".into());
        return Err(err);
    }

    for metric in metrics {
        if metric.trim().is_empty() {
            let mut err = ValidationError::new("metric_blank");
            err.message = Some("Metric names must not be blank".into());
            return Err(err);
        }
        if metric.len() > MAX_METRIC_NAME_LENGTH {
            let mut err = ValidationError::new("metric_too_long");
            err.message = Some("Metric names must be at most 64 characters".into());
            return Err(err);
        }
    }

    Ok(())
}

/// Validates that every entry of a string-set predicate is non-blank.
pub fn validate_string_set(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        let mut err = ValidationError::new("set_entry_blank");
        err.message = Some("Filter values must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
