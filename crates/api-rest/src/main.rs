//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging of the HTTP layer. Unlike the workspace's main
//! `report-run` binary it does not load a `.env` file; everything comes from the process
//! environment.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::cache::CacheConfig;
use api_rest::{router, shutdown_signal, AppState};
use api_shared::HealthService;
use report_core::{
    config::{persist_interval_from_env_value, persistence_enabled_from_env_value},
    CoreConfig, InMemoryStorage, ReportRepository, ReportService, REPORTS_FILENAME,
};

/// Main entry point for the standalone REST API server
///
/// # Environment Variables
/// - `REPORT_REST_ADDR`: Server address (default: "0.0.0.0:3001")
/// - `DATA_DIR`: Snapshot directory (default: "data")
/// - `PERSISTENCE_ENABLED`, `PERSIST_INTERVAL_MS`: snapshot policy
/// - `CACHE_ENABLED`, `CACHE_TTL`: response cache
/// - `REPORT_ENV`: environment name reported by `/health` (default: "development")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is malformed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("report_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("REPORT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| report_core::DEFAULT_DATA_DIR.into());

    let cfg = CoreConfig::new(
        PathBuf::from(data_dir),
        persistence_enabled_from_env_value(std::env::var("PERSISTENCE_ENABLED").ok())?,
        persist_interval_from_env_value(std::env::var("PERSIST_INTERVAL_MS").ok())?,
    )?;
    let cache = CacheConfig::from_env_values(
        std::env::var("CACHE_ENABLED").ok(),
        std::env::var("CACHE_TTL").ok(),
    )?;
    let environment = std::env::var("REPORT_ENV").unwrap_or_else(|_| "development".into());

    let repository = ReportRepository::new(Arc::new(InMemoryStorage::new(&cfg, REPORTS_FILENAME)));
    let service = ReportService::new(repository);
    service.initialize().await;

    tracing::info!("-- Starting report REST API on {}", addr);

    let app = router(AppState::new(
        service.clone(),
        cache,
        HealthService::new(environment),
    ));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    service.close().await;
    served?;

    Ok(())
}
