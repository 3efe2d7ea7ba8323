//! Period-over-period comparison models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::report::{ReportConfig, ReportData};

/// How the comparison window is derived from the current date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviousPeriod {
    /// Window of equal length immediately preceding the current one.
    #[default]
    Previous,
    LastMonth,
    LastQuarter,
    LastYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Change of one key metric between two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub percentage_change: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportComparison {
    pub current: ReportData,
    pub previous: ReportData,
    pub comparison: BTreeMap<String, MetricComparison>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompareReportsRequest {
    #[validate(nested)]
    pub config: ReportConfig,
    #[serde(default)]
    pub previous_period: PreviousPeriod,
}
