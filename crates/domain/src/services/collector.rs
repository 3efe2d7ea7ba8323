//! Data collectors feeding the report pipeline.

use std::collections::HashMap;
use thiserror::Error;

use crate::models::{DateRange, ReportRecord, ReportType};

/// Collection errors.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed source data: {0}")]
    Malformed(String),
}

/// Reads raw records for a report type within a date range.
#[async_trait::async_trait]
pub trait DataCollector: Send + Sync {
    async fn collect(
        &self,
        report_type: ReportType,
        range: &DateRange,
    ) -> Result<Vec<ReportRecord>, CollectError>;
}

/// Collector backed by seeded in-memory records.
///
/// Used for local development and tests. Records without a timestamp are
/// always returned; `Custom` yields the union of every other type.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollector {
    records: HashMap<ReportType, Vec<ReportRecord>>,
    simulate_failure: bool,
}

impl InMemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector that fails every call.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn with_records(mut self, report_type: ReportType, records: Vec<ReportRecord>) -> Self {
        self.records.entry(report_type).or_default().extend(records);
        self
    }

    fn seeded(&self, report_type: ReportType) -> Vec<ReportRecord> {
        match report_type {
            ReportType::Custom => ReportType::ALL
                .iter()
                .filter_map(|t| self.records.get(t))
                .flatten()
                .cloned()
                .collect(),
            other => self.records.get(&other).cloned().unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl DataCollector for InMemoryCollector {
    async fn collect(
        &self,
        report_type: ReportType,
        range: &DateRange,
    ) -> Result<Vec<ReportRecord>, CollectError> {
        if self.simulate_failure {
            tracing::warn!(report_type = %report_type, "In-memory collector simulating failure");
            return Err(CollectError::Unavailable("Simulated failure".to_string()));
        }

        let records: Vec<_> = self
            .seeded(report_type)
            .into_iter()
            .filter(|r| r.timestamp().map_or(true, |at| range.contains(at)))
            .collect();

        tracing::debug!(
            report_type = %report_type,
            records = records.len(),
            "Collected in-memory records"
        );

        Ok(records)
    }
}
