//! Common test utilities for integration tests.
//!
//! The router runs in-process against an in-memory collector, a fake remote
//! report API and a temporary local store directory. Collector tests use a
//! PostgreSQL database named by `TEST_DATABASE_URL`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use domain::models::{
    ListReportsQuery, ReportData, ReportRecord, ReportTemplate, ReportType, UpdateReportRequest,
};
use domain::services::{DataCollector, InMemoryCollector};
use lexdesk_api::{
    app::{create_app, remote_from_config, AppState},
    config::{Config, LoggingConfig, RemoteConfig, SecurityConfig, ServerConfig, StorageConfig},
};
use persistence::db::DatabaseConfig;
use persistence::remote::RemoteReportApi;
use persistence::StoreError;
use shared::pagination::Page;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

/// Test configuration with the local store rooted in `dir`.
pub fn test_config(dir: &TempDir) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        remote: RemoteConfig::default(),
        storage: StorageConfig {
            dir: dir.path().to_path_buf(),
        },
    }
}

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
}

fn user(id: &str, status: &str, plan: &str, revenue: f64, created_at: DateTime<Utc>) -> ReportRecord {
    ReportRecord {
        id: Some(id.to_string()),
        name: Some(format!("Cliente {}", id)),
        status: Some(status.to_string()),
        plan: Some(plan.to_string()),
        revenue: Some(revenue),
        credits: Some(10.0),
        created_at: Some(created_at),
        kind: Some("user".to_string()),
        ..Default::default()
    }
}

/// Three users in Q1 2024 (two active) and one financial entry.
pub fn seeded_collector() -> InMemoryCollector {
    InMemoryCollector::new()
        .with_records(
            ReportType::Users,
            vec![
                user("u1", "active", "pro", 100.0, at(1, 15)),
                user("u2", "inactive", "basic", 50.0, at(2, 10)),
                user("u3", "active", "pro", 200.0, at(3, 20)),
            ],
        )
        .with_records(
            ReportType::Financial,
            vec![ReportRecord {
                id: Some("f1".to_string()),
                revenue: Some(350.0),
                date: Some(at(2, 1)),
                kind: Some("invoice".to_string()),
                ..Default::default()
            }],
        )
}

/// How the fake remote API answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMode {
    Healthy,
    Failing,
}

/// In-memory stand-in for the remote report API.
pub struct FakeRemote {
    mode: RemoteMode,
    calls: AtomicUsize,
    reports: Mutex<Vec<ReportData>>,
    templates: Mutex<Vec<ReportTemplate>>,
}

impl FakeRemote {
    pub fn new(mode: RemoteMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
            reports: Mutex::new(Vec::new()),
            templates: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stored_reports(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            RemoteMode::Healthy => Ok(()),
            RemoteMode::Failing => Err(StoreError::RemoteUnavailable(
                "connection refused".to_string(),
            )),
        }
    }

    fn find(&self, id: Uuid) -> Result<ReportData, StoreError> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("report {}", id)))
    }
}

#[async_trait]
impl RemoteReportApi for FakeRemote {
    async fn list_reports(&self, query: &ListReportsQuery) -> Result<Page<ReportData>, StoreError> {
        self.enter()?;
        let reports: Vec<_> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        Ok(query.page_query().paginate(reports))
    }

    async fn create_report(&self, report: &ReportData) -> Result<ReportData, StoreError> {
        self.enter()?;
        self.reports.lock().unwrap().push(report.clone());
        Ok(report.clone())
    }

    async fn get_report(&self, id: Uuid) -> Result<ReportData, StoreError> {
        self.enter()?;
        self.find(id)
    }

    async fn update_report(
        &self,
        id: Uuid,
        update: &UpdateReportRequest,
    ) -> Result<ReportData, StoreError> {
        self.enter()?;
        let mut reports = self.reports.lock().unwrap();
        let report = reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("report {}", id)))?;
        update.apply_to(report);
        Ok(report.clone())
    }

    async fn delete_report(&self, id: Uuid) -> Result<(), StoreError> {
        self.enter()?;
        self.reports.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn regenerate_report(&self, id: Uuid) -> Result<ReportData, StoreError> {
        self.enter()?;
        let mut report = self.find(id)?;
        report.summary.generated_at = Utc::now();
        Ok(report)
    }

    async fn list_templates(&self) -> Result<Vec<ReportTemplate>, StoreError> {
        self.enter()?;
        Ok(self.templates.lock().unwrap().clone())
    }

    async fn create_template(&self, template: &ReportTemplate) -> Result<ReportTemplate, StoreError> {
        self.enter()?;
        self.templates.lock().unwrap().push(template.clone());
        Ok(template.clone())
    }

    async fn delete_template(&self, id: Uuid) -> Result<(), StoreError> {
        self.enter()?;
        self.templates.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

/// A router backed by the local store only.
pub fn local_app(dir: &TempDir, collector: InMemoryCollector) -> Router {
    let collector: Arc<dyn DataCollector> = Arc::new(collector);
    create_app(AppState::new(test_config(dir), collector, None, None))
}

/// A router talking to `remote`, with the local store as fallback.
pub fn remote_app(dir: &TempDir, remote: Arc<FakeRemote>) -> Router {
    let collector: Arc<dyn DataCollector> = Arc::new(seeded_collector());
    let mut config = test_config(dir);
    config.remote.base_url = "http://reports.test".to_string();
    let remote: Arc<dyn RemoteReportApi> = remote;
    create_app(AppState::new(config, collector, Some(remote), None))
}

/// Connects to `TEST_DATABASE_URL` and applies the migrations.
///
/// Returns `None` when the variable is unset so collector tests are skipped
/// on machines without PostgreSQL.
pub async fn test_pool() -> Option<PgPool> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// A router with the real HTTP client configured but no bearer token.
pub fn unauthenticated_app(dir: &TempDir) -> Router {
    let collector: Arc<dyn DataCollector> = Arc::new(seeded_collector());
    let mut config = test_config(dir);
    config.remote.base_url = "http://127.0.0.1:9".to_string();
    let remote = remote_from_config(&config.remote).unwrap();
    create_app(AppState::new(config, collector, remote, None))
}

/// A Q1 2024 users report config as sent by clients.
pub fn users_config(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "type": "users",
        "dateRange": {
            "from": "2024-01-01T00:00:00Z",
            "to": "2024-03-31T23:59:59Z"
        }
    })
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

pub async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

