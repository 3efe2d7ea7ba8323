use anyhow::Result;
use domain::services::{DataCollector, InMemoryCollector};
use persistence::repositories::ReportSourceRepository;
use std::sync::Arc;
use tracing::{info, warn};

use lexdesk_api::{app, config, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Lexdesk reports v{}", env!("CARGO_PKG_VERSION"));

    let (collector, pool) = if config.database.is_configured() {
        let pool = persistence::db::create_pool(&config.database).await?;

        info!("Running database migrations...");
        sqlx::migrate!("../persistence/src/migrations")
            .run(&pool)
            .await?;
        info!("Migrations completed");

        (
            Arc::new(ReportSourceRepository::new(pool.clone())) as Arc<dyn DataCollector>,
            Some(pool),
        )
    } else {
        warn!("No database configured, collecting from an empty in-memory source");
        (Arc::new(InMemoryCollector::new()) as Arc<dyn DataCollector>, None)
    };

    let remote = app::remote_from_config(&config.remote)?;
    if remote.is_none() {
        info!(dir = %config.storage.dir.display(), "Remote report API disabled, using local store");
    }

    let addr = config.socket_addr()?;
    let state = app::AppState::new(config, collector, remote, pool);
    let app = app::create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
