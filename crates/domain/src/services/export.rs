//! Report exporter.
//!
//! Serializes a finished [`ReportData`] into a downloadable file. The `excel`
//! and `pdf` formats share one HTML preview document and differ only in MIME
//! type and extension; neither is a genuine binary spreadsheet or PDF.

use serde_json::Value;
use thiserror::Error;

use crate::models::{ExportFormat, ReportData, ReportRows};

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A rendered export ready to be sent to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders `report` in the requested format.
pub fn export_report(report: &ReportData, format: ExportFormat) -> Result<ExportedFile, ExportError> {
    let content = match format {
        ExportFormat::Csv => to_csv(&report.data)?,
        ExportFormat::Json => serde_json::to_string_pretty(report)?,
        ExportFormat::Excel | ExportFormat::Pdf => to_html(report)?,
    };

    Ok(ExportedFile {
        file_name: file_name(report, format),
        content_type: format.content_type(),
        bytes: content.into_bytes(),
    })
}

/// `{slug}_{YYYY-MM-DD}.{ext}`, dated by the report's generation time.
pub fn file_name(report: &ReportData, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        slugify(&report.config.name),
        report.summary.generated_at.format("%Y-%m-%d"),
        format.extension()
    )
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}

/// Column headers and row values of the report's top-level rows.
///
/// Flat records use the union of their field names in first-seen order.
/// Grouped data keeps the bucket shape; `items` is not flattened.
fn tabulate(rows: &ReportRows) -> Result<(Vec<String>, Vec<Vec<Value>>), ExportError> {
    match rows {
        ReportRows::Flat(records) => {
            let objects = records
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;

            let mut headers: Vec<String> = Vec::new();
            for object in &objects {
                if let Value::Object(map) = object {
                    for key in map.keys() {
                        if !headers.contains(key) {
                            headers.push(key.clone());
                        }
                    }
                }
            }

            let table = objects
                .iter()
                .map(|object| {
                    headers
                        .iter()
                        .map(|h| object.get(h).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect();
            Ok((headers, table))
        }
        ReportRows::Grouped(buckets) => {
            let headers = vec!["period".to_string(), "count".to_string(), "items".to_string()];
            let table = buckets
                .iter()
                .map(|b| -> Result<Vec<Value>, ExportError> {
                    Ok(vec![
                        Value::String(b.period.clone()),
                        Value::from(b.count),
                        serde_json::to_value(&b.items)?,
                    ])
                })
                .collect::<Result<Vec<_>, ExportError>>()?;
            Ok((headers, table))
        }
    }
}

fn to_csv(rows: &ReportRows) -> Result<String, ExportError> {
    let (headers, table) = tabulate(rows)?;

    let mut csv = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| csv_header(h)).collect();
    csv.push_str(&header_cells.join(","));
    csv.push('\n');

    for row in table {
        let cells: Vec<String> = row.iter().map(csv_cell).collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }

    Ok(csv)
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        nested => quote(&nested.to_string()),
    }
}

/// Header names stay bare unless they would break the row.
fn csv_header(name: &str) -> String {
    if name.contains([',', '"', '\n', '\r']) {
        quote(name)
    } else {
        name.to_string()
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn to_html(report: &ReportData) -> Result<String, ExportError> {
    let (headers, table) = tabulate(&report.data)?;
    let summary = &report.summary;
    let title = escape_html(&report.config.name);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str(
        "<style>table{border-collapse:collapse}th,td{border:1px solid #ccc;padding:4px 8px}</style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", title));
    if let Some(description) = &report.config.description {
        html.push_str(&format!("<p>{}</p>\n", escape_html(description)));
    }

    html.push_str("<ul>\n");
    html.push_str(&format!(
        "<li>Tipo: {}</li>\n",
        report.config.report_type.as_str()
    ));
    html.push_str(&format!(
        "<li>Período: {}</li>\n",
        escape_html(&summary.time_range)
    ));
    html.push_str(&format!(
        "<li>Gerado em: {}</li>\n",
        summary.generated_at.format("%d/%m/%Y %H:%M")
    ));
    html.push_str(&format!(
        "<li>Total de registros: {}</li>\n",
        summary.total_records
    ));
    for (name, value) in &summary.key_metrics {
        html.push_str(&format!("<li>{}: {}</li>\n", escape_html(name), value));
    }
    html.push_str("</ul>\n");

    html.push_str("<table>\n<thead><tr>");
    for header in &headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table {
        html.push_str("<tr>");
        for value in row {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            html.push_str(&format!("<td>{}</td>", escape_html(&text)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

    Ok(html)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
