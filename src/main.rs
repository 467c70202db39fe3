use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::cache::CacheConfig;
use api_rest::{AppState, router, shutdown_signal};
use api_shared::HealthService;
use report_core::config::{persist_interval_from_env_value, persistence_enabled_from_env_value};
use report_core::{CoreConfig, InMemoryStorage, REPORTS_FILENAME, ReportRepository, ReportService};

/// Main entry point for the report portal
///
/// Loads the report snapshot, serves the REST API until Ctrl-C or SIGTERM, then writes a final
/// snapshot before exiting.
///
/// # Environment Variables
/// - `REPORT_REST_ADDR`: REST server address (default: "0.0.0.0:3001")
/// - `DATA_DIR`: Directory for the report snapshot (default: "data")
/// - `PERSISTENCE_ENABLED`: Enable periodic and final snapshots (default: "true")
/// - `PERSIST_INTERVAL_MS`: Snapshot interval in milliseconds (default: "60000")
/// - `CACHE_ENABLED`: Enable the response cache (default: "false")
/// - `CACHE_TTL`: Default cache entry lifetime in seconds (default: "300")
/// - `REPORT_ENV`: Environment name reported by `/health` (default: "development")
///
/// # Returns
/// * `Ok(())` - If the server starts, runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("report_run=info".parse()?)
                .add_directive("report_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("REPORT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let data_dir =
        std::env::var("DATA_DIR").unwrap_or_else(|_| report_core::DEFAULT_DATA_DIR.into());

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

    tracing::info!(
        "++ Report store at {} (persistence {}, every {:?})",
        cfg.reports_file().display(),
        if cfg.persistence_enabled() { "on" } else { "off" },
        cfg.persist_interval()
    );

    let repository = ReportRepository::new(Arc::new(InMemoryStorage::new(&cfg, REPORTS_FILENAME)));
    let service = ReportService::new(repository);
    service.initialize().await;

    tracing::info!("++ Starting report REST on {}", rest_addr);

    let rest_app = router(AppState::new(
        service.clone(),
        cache,
        HealthService::new(environment),
    ));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let served = axum::serve(listener, rest_app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Flush pending writes even if serving failed.
    service.close().await;
    tracing::info!("++ Report store closed");
    served?;

    Ok(())
}
