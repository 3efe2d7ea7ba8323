//! Report routes: generation, storage, export, comparison and templates.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::models::{
    CompareReportsRequest, ExportFormat, ListReportsQuery, ReportComparison, ReportConfig,
    ReportData, ReportTemplate, UpdateReportRequest,
};
use serde::Deserialize;
use shared::pagination::Page;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Generate and persist a report.
///
/// POST /api/v1/reports
pub async fn create_report(
    State(state): State<AppState>,
    Json(config): Json<ReportConfig>,
) -> Result<(StatusCode, Json<ReportData>), ApiError> {
    let report = state.reports.generate(config).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/reports
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<Page<ReportData>>, ApiError> {
    Ok(Json(state.reports.list(&query).await?))
}

/// GET /api/v1/reports/:id
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportData>, ApiError> {
    Ok(Json(state.reports.get(id).await?))
}

/// Update report metadata (name, description, scheduled).
///
/// PUT /api/v1/reports/:id
pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReportRequest>,
) -> Result<Json<ReportData>, ApiError> {
    Ok(Json(state.reports.update(id, request).await?))
}

/// DELETE /api/v1/reports/:id
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.reports.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/reports/:id/generate
pub async fn regenerate_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportData>, ApiError> {
    Ok(Json(state.reports.regenerate(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: ExportFormat,
}

/// `attachment` disposition with an ASCII `filename` and the exact UTF-8
/// name in `filename*` (RFC 5987).
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// Download a report as a file.
///
/// GET /api/v1/reports/:id/export?format=csv|json|excel|pdf
pub async fn export_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let file = state.reports.export(id, query.format).await?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        file.bytes,
    )
        .into_response())
}

/// Compare a report against a previous period. Nothing is persisted.
///
/// POST /api/v1/reports/compare
pub async fn compare_reports(
    State(state): State<AppState>,
    Json(request): Json<CompareReportsRequest>,
) -> Result<Json<ReportComparison>, ApiError> {
    Ok(Json(state.reports.compare(request).await?))
}

/// GET /api/v1/reports/templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportTemplate>>, ApiError> {
    Ok(Json(state.reports.list_templates().await?))
}

/// Save a report configuration as a template.
///
/// POST /api/v1/reports/templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(config): Json<ReportConfig>,
) -> Result<(StatusCode, Json<ReportTemplate>), ApiError> {
    let template = state.reports.save_template(config).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// DELETE /api/v1/reports/templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.reports.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Copy a template into a fresh working config.
///
/// POST /api/v1/reports/templates/:id/apply
pub async fn apply_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportConfig>, ApiError> {
    Ok(Json(state.reports.apply_template(id).await?))
}
