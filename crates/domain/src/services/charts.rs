//! Chart projector.

use std::collections::BTreeMap;

use crate::models::{
    ChartData, ChartDataset, ChartType, ReportConfig, ReportFormat, ReportRecord, ReportRows,
};

/// Builds chart series for reports requested in chart format.
///
/// Returns `None` for any other format. A grouped report gets a line series
/// of record counts per period; records carrying a `type` add a pie series.
pub fn project_charts(
    rows: &ReportRows,
    records: &[ReportRecord],
    config: &ReportConfig,
) -> Option<Vec<ChartData>> {
    if config.format != ReportFormat::Chart {
        return None;
    }

    let mut charts = Vec::new();

    if let ReportRows::Grouped(buckets) = rows {
        charts.push(ChartData {
            chart_type: ChartType::Line,
            title: format!("{} ao longo do tempo", config.name),
            labels: buckets.iter().map(|b| b.period.clone()).collect(),
            datasets: vec![ChartDataset {
                label: "Registros".to_string(),
                data: buckets.iter().map(|b| b.count as f64).collect(),
            }],
        });
    }

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for kind in records.iter().filter_map(|r| r.kind.as_deref()) {
        *by_kind.entry(kind).or_default() += 1;
    }
    if !by_kind.is_empty() {
        charts.push(ChartData {
            chart_type: ChartType::Pie,
            title: "Distribuição por tipo".to_string(),
            labels: by_kind.keys().map(|k| k.to_string()).collect(),
            datasets: vec![ChartDataset {
                label: "Quantidade".to_string(),
                data: by_kind.values().map(|&n| n as f64).collect(),
            }],
        });
    }

    Some(charts)
}
