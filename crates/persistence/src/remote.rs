//! Client for the remote report API.
//!
//! Every call carries `Authorization: Bearer <token>` and every successful
//! response is wrapped in a `{ "data": ... }` envelope.

use async_trait::async_trait;
use domain::models::{
    ChartData, ExportFormat, ListReportsQuery, ReportConfig, ReportData, ReportFormat,
    ReportRows, ReportSummary, ReportTemplate, ReportType, UpdateReportRequest,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::pagination::Page;
use std::time::Duration;
use uuid::Uuid;

use crate::error::StoreError;
use crate::token::TokenSource;

/// Operations offered by the remote report API.
#[async_trait]
pub trait RemoteReportApi: Send + Sync {
    async fn list_reports(&self, query: &ListReportsQuery) -> Result<Page<ReportData>, StoreError>;

    async fn create_report(&self, report: &ReportData) -> Result<ReportData, StoreError>;

    async fn get_report(&self, id: Uuid) -> Result<ReportData, StoreError>;

    async fn update_report(
        &self,
        id: Uuid,
        update: &UpdateReportRequest,
    ) -> Result<ReportData, StoreError>;

    async fn delete_report(&self, id: Uuid) -> Result<(), StoreError>;

    /// Asks the server to re-run generation for a stored report.
    async fn regenerate_report(&self, id: Uuid) -> Result<ReportData, StoreError>;

    async fn list_templates(&self) -> Result<Vec<ReportTemplate>, StoreError>;

    async fn create_template(&self, template: &ReportTemplate) -> Result<ReportTemplate, StoreError>;

    async fn delete_template(&self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Request body of `POST /api/reports`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReportBody<'a> {
    id: Uuid,
    name: &'a str,
    description: Option<&'a str>,
    #[serde(rename = "type")]
    report_type: ReportType,
    config: &'a ReportConfig,
    data: &'a ReportRows,
    summary: &'a ReportSummary,
    charts: Option<&'a Vec<ChartData>>,
    format: ReportFormat,
    export_formats: &'a [ExportFormat],
    scheduled: bool,
}

impl<'a> From<&'a ReportData> for CreateReportBody<'a> {
    fn from(report: &'a ReportData) -> Self {
        Self {
            id: report.id,
            name: &report.config.name,
            description: report.config.description.as_deref(),
            report_type: report.config.report_type,
            config: &report.config,
            data: &report.data,
            summary: &report.summary,
            charts: report.charts.as_ref(),
            format: report.config.format,
            export_formats: &report.config.export_formats,
            scheduled: report.scheduled,
        }
    }
}

/// `reqwest`-backed implementation of [`RemoteReportApi`].
#[derive(Clone)]
pub struct HttpReportApi {
    client: Client,
    base_url: String,
    token: TokenSource,
}

impl HttpReportApi {
    pub fn new(
        base_url: impl Into<String>,
        token: TokenSource,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Builds an authenticated request. Fails before any I/O without a token.
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        let token = self.token.token().await?;
        Ok(self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    async fn execute(&self, request: RequestBuilder, what: &str) -> Result<Response, StoreError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, what = what, "Remote report API rejected request");
            return Err(StoreError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, StoreError> {
        let envelope: Envelope<T> = self.execute(request, what).await?.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl RemoteReportApi for HttpReportApi {
    async fn list_reports(&self, query: &ListReportsQuery) -> Result<Page<ReportData>, StoreError> {
        let page = query.page_query();
        let mut params = vec![
            ("page", page.page().to_string()),
            ("limit", page.limit().to_string()),
        ];
        if let Some(report_type) = query.report_type {
            params.push(("type", report_type.as_str().to_string()));
        }
        if let Some(format) = query.format {
            params.push(("format", format.as_str().to_string()));
        }

        let request = self.request(Method::GET, "/api/reports").await?.query(&params);
        self.data(request, "reports").await
    }

    async fn create_report(&self, report: &ReportData) -> Result<ReportData, StoreError> {
        let request = self
            .request(Method::POST, "/api/reports")
            .await?
            .json(&CreateReportBody::from(report));
        self.data(request, "report").await
    }

    async fn get_report(&self, id: Uuid) -> Result<ReportData, StoreError> {
        let request = self
            .request(Method::GET, &format!("/api/reports/{}", id))
            .await?;
        self.data(request, &format!("report {}", id)).await
    }

    async fn update_report(
        &self,
        id: Uuid,
        update: &UpdateReportRequest,
    ) -> Result<ReportData, StoreError> {
        let request = self
            .request(Method::PUT, &format!("/api/reports/{}", id))
            .await?
            .json(update);
        self.data(request, &format!("report {}", id)).await
    }

    async fn delete_report(&self, id: Uuid) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, &format!("/api/reports/{}", id))
            .await?;
        self.execute(request, &format!("report {}", id)).await?;
        Ok(())
    }

    async fn regenerate_report(&self, id: Uuid) -> Result<ReportData, StoreError> {
        let request = self
            .request(Method::POST, &format!("/api/reports/{}/generate", id))
            .await?;
        self.data(request, &format!("report {}", id)).await
    }

    async fn list_templates(&self) -> Result<Vec<ReportTemplate>, StoreError> {
        let request = self.request(Method::GET, "/api/reports/templates").await?;
        self.data(request, "templates").await
    }

    async fn create_template(&self, template: &ReportTemplate) -> Result<ReportTemplate, StoreError> {
        let request = self
            .request(Method::POST, "/api/reports/templates")
            .await?
            .json(template);
        self.data(request, "template").await
    }

    async fn delete_template(&self, id: Uuid) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, &format!("/api/reports/templates/{}", id))
            .await?;
        self.execute(request, &format!("template {}", id)).await?;
        Ok(())
    }
}
