//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
    pub storage: StorageHealth,
    pub remote: RemoteHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Local fallback store status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageHealth {
    pub writable: bool,
}

/// Remote report API status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoteHealth {
    pub enabled: bool,
    /// `local_only` once the session fell back to the local store.
    pub mode: String,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn check_database(state: &AppState) -> Option<DatabaseHealth> {
    let pool = state.pool.as_ref()?;
    let start = Instant::now();
    let connected = sqlx::query("SELECT 1").execute(pool).await.is_ok();
    Some(DatabaseHealth {
        connected,
        latency_ms: connected.then(|| start.elapsed().as_millis() as u64),
    })
}

async fn check_storage(state: &AppState) -> StorageHealth {
    let dir = state.local_store.dir();
    let writable = match tokio::fs::create_dir_all(dir).await {
        Ok(()) => tokio::fs::metadata(dir)
            .await
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false),
        Err(_) => false,
    };
    StorageHealth { writable }
}

fn remote_health(state: &AppState) -> RemoteHealth {
    let enabled = state.config.remote.is_enabled();
    let mode = if !enabled || state.executor.is_remote_disabled() {
        "local_only"
    } else {
        "remote"
    };
    RemoteHealth {
        enabled,
        mode: mode.to_string(),
    }
}

fn is_healthy(database: Option<&DatabaseHealth>, storage: &StorageHealth) -> bool {
    database.map_or(true, |db| db.connected) && storage.writable
}

/// Full health check endpoint.
///
/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let database = check_database(&state).await;
    let storage = check_storage(&state).await;
    let healthy = is_healthy(database.as_ref(), &storage);

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        storage,
        remote: remote_health(&state),
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Liveness probe endpoint.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe: the database (when configured) answers and the local
/// store directory is writable.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    let database = check_database(&state).await;
    let storage = check_storage(&state).await;

    if is_healthy(database.as_ref(), &storage) {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
