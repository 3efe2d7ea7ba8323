use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::services::DataCollector;
use persistence::local_store::LocalStore;
use persistence::remote::{HttpReportApi, RemoteReportApi};
use persistence::repositories::{ReportRepository, TemplateRepository};
use persistence::resilient::ResilientExecutor;
use persistence::token::TokenSource;
use persistence::StoreError;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, RemoteConfig};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, reports};
use crate::services::ReportService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub reports: Arc<ReportService>,
    pub local_store: Arc<LocalStore>,
    pub executor: Arc<ResilientExecutor>,
    /// Present when report sources are read from PostgreSQL.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wires the repositories and the report service. Without a remote API
    /// every store operation goes to the local store from the start.
    pub fn new(
        config: Config,
        collector: Arc<dyn DataCollector>,
        remote: Option<Arc<dyn RemoteReportApi>>,
        pool: Option<PgPool>,
    ) -> Self {
        let local_store = Arc::new(LocalStore::new(&config.storage.dir));
        let executor = Arc::new(if remote.is_some() {
            ResilientExecutor::new()
        } else {
            ResilientExecutor::local_only()
        });

        let reports = ReportService::new(
            collector,
            ReportRepository::new(remote.clone(), local_store.clone(), executor.clone()),
            TemplateRepository::new(remote, local_store.clone(), executor.clone()),
        );

        Self {
            config: Arc::new(config),
            reports: Arc::new(reports),
            local_store,
            executor,
            pool,
        }
    }
}

/// Builds the remote report API client, or `None` when no base URL is set.
pub fn remote_from_config(
    config: &RemoteConfig,
) -> Result<Option<Arc<dyn RemoteReportApi>>, StoreError> {
    if !config.is_enabled() {
        return Ok(None);
    }

    let token = match &config.token_file {
        Some(path) => TokenSource::File(path.clone()),
        None => TokenSource::Static(config.token.clone()),
    };
    let api = HttpReportApi::new(
        config.base_url.clone(),
        token,
        Duration::from_secs(config.timeout_secs),
    )?;

    Ok(Some(Arc::new(api)))
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let report_routes = Router::new()
        .route(
            "/api/v1/reports",
            post(reports::create_report).get(reports::list_reports),
        )
        .route("/api/v1/reports/compare", post(reports::compare_reports))
        .route(
            "/api/v1/reports/templates",
            get(reports::list_templates).post(reports::create_template),
        )
        .route(
            "/api/v1/reports/templates/:id",
            delete(reports::delete_template),
        )
        .route(
            "/api/v1/reports/templates/:id/apply",
            post(reports::apply_template),
        )
        .route(
            "/api/v1/reports/:id",
            get(reports::get_report)
                .put(reports::update_report)
                .delete(reports::delete_report),
        )
        .route(
            "/api/v1/reports/:id/generate",
            post(reports::regenerate_report),
        )
        .route("/api/v1/reports/:id/export", get(reports::export_report));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(report_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
