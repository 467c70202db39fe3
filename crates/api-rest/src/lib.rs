//! # API REST
//!
//! REST API implementation for the report portal.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, error status codes, CORS, response caching)
//!
//! Uses `api-shared` for wire types and `report-core` for every report operation.

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod error;
pub mod handlers;

use api_shared::{
    ApiEndpoints, ApiInfoRes, CacheConfigRes, CacheStats, CacheStatsRes, CreateReportReq,
    ErrorBody, ErrorRes, HealthRes, HealthService, ReportListRes, ReportMessageRes, ReportRes,
    UpdateReportReq,
};
use axum::routing::get;
use axum::Router;
use cache::{CacheConfig, ResponseCache};
use report_core::ReportService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: ReportService,
    pub cache: Arc<ResponseCache>,
    pub health: HealthService,
}

impl AppState {
    pub fn new(service: ReportService, cache: CacheConfig, health: HealthService) -> Self {
        Self {
            service,
            cache: Arc::new(ResponseCache::new(cache)),
            health,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::api_info,
        handlers::list_reports,
        handlers::get_report,
        handlers::create_report,
        handlers::update_report,
        handlers::delete_report,
        handlers::list_alerts,
        handlers::cache_stats,
    ),
    components(schemas(
        HealthRes,
        ApiInfoRes,
        ApiEndpoints,
        ErrorRes,
        ErrorBody,
        ReportRes,
        ReportListRes,
        ReportMessageRes,
        CreateReportReq,
        UpdateReportReq,
        CacheStatsRes,
        CacheStats,
        CacheConfigRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with every route, Swagger UI, request tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api", get(handlers::api_info))
        .route(
            "/api/v1/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/api/v1/reports/:id",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .route("/api/v1/alerts", get(handlers::list_alerts))
        .route("/api/stats/cache", get(handlers::cache_stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use report_core::constants::REPORTS_FILENAME;
    use report_core::{CoreConfig, InMemoryStorage, ReportDraft, ReportRepository};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn seeded_state(temp_dir: &TempDir, cache_enabled: bool) -> AppState {
        let cfg = CoreConfig::new(temp_dir.path().to_path_buf(), false, Duration::from_secs(60))
            .expect("CoreConfig::new should succeed");
        let repository =
            ReportRepository::new(Arc::new(InMemoryStorage::new(&cfg, REPORTS_FILENAME)));

        let fixtures = [
            ("1", "John Smith", "P001", "2025-03-15T10:30:00Z", "General", "Annual physical examination."),
            ("2", "Jane Doe", "P002", "2025-03-14T14:45:00Z", "Lab", "Mild tachycardia during stress test."),
            ("3", "Bob Johnson", "P003", "2025-03-10T09:15:00Z", "Radiology", "Chest X-ray clear."),
            ("4", "Sarah Williams", "P004", "2025-03-08T11:00:00Z", "Cardiology", "Intermittent arrhythmia noted."),
            ("5", "John Smith", "P001", "2025-03-09T09:00:00Z", "Pulmonology", "Spirometry within normal limits."),
        ];
        for (id, name, patient_id, date, report_type, summary) in fixtures {
            repository.create(ReportDraft {
                id: Some(id.into()),
                patient_name: Some(name.into()),
                patient_id: Some(patient_id.into()),
                date: Some(date.into()),
                summary: Some(summary.into()),
                report_type: Some(report_type.into()),
                created_at: Some(date.into()),
                updated_at: Some(date.into()),
            });
        }

        AppState::new(
            ReportService::new(repository),
            CacheConfig {
                enabled: cache_enabled,
                ..CacheConfig::default()
            },
            HealthService::new("test"),
        )
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = app.oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }

    fn ids(page: &Value) -> Vec<String> {
        page["data"]
            .as_array()
            .expect("data should be an array")
            .iter()
            .map(|r| r["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health_and_api_info() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(app.clone(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
        assert_eq!(body["environment"], "test");

        let (status, body) = send(app, Method::GET, "/api", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Patient Portal API");
        assert_eq!(body["endpoints"]["reports"], "/v1/reports");
    }

    #[tokio::test]
    async fn test_list_defaults_to_newest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(app, Method::GET, "/api/v1/reports", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["1", "2", "3", "5", "4"]);
        assert_eq!(body["total"], 5);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 10);
        assert_eq!(body["totalPages"], 1);
    }

    #[tokio::test]
    async fn test_list_with_filters_and_paging() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(
            app.clone(),
            Method::GET,
            "/api/v1/reports?fromDate=2025-03-10T00:00:00Z&toDate=2025-03-15T23:59:59Z&sortBy=date&sortDirection=asc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["3", "2", "1"]);

        let (_, body) = send(
            app.clone(),
            Method::GET,
            "/api/v1/reports?patientName=john&limit=1&offset=1&sortBy=patientName&sortDirection=asc",
            None,
        )
        .await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 2);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(ids(&body), vec!["1"]);

        let (_, body) = send(app, Method::GET, "/api/v1/reports?patientName=nobody&offset=30", None).await;
        assert_eq!(body, json!({"data": [], "total": 0, "page": 1, "limit": 10, "totalPages": 0}));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_parameters() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        for uri in [
            "/api/v1/reports?limit=0",
            "/api/v1/reports?limit=500",
            "/api/v1/reports?offset=-1",
            "/api/v1/reports?fromDate=03/10/2025",
        ] {
            let (status, body) = send(app.clone(), Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "INVALID_PARAMETER", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_get_report_and_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(app.clone(), Method::GET, "/api/v1/reports/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patientName"], "Jane Doe");
        assert_eq!(body["type"], "Lab");

        let (status, body) = send(app, Method::GET, "/api/v1/reports/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "REPORT_NOT_FOUND");
        assert_eq!(body["error"]["message"], "Report with id 42 not found");
    }

    #[tokio::test]
    async fn test_create_update_delete_cycle() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/v1/reports",
            Some(json!({"patientName": "Emily Davis", "summary": "Glucose tolerance test normal."})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Report created successfully");
        assert_eq!(body["data"]["type"], "General");
        let id = body["data"]["id"].as_str().expect("id").to_string();

        let (status, body) = send(
            app.clone(),
            Method::PUT,
            &format!("/api/v1/reports/{id}"),
            Some(json!({"type": "Endocrinology"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Report updated successfully");
        assert_eq!(body["data"]["type"], "Endocrinology");
        assert_eq!(body["data"]["patientName"], "Emily Davis");

        let (status, body) =
            send(app.clone(), Method::DELETE, &format!("/api/v1/reports/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(app.clone(), Method::DELETE, &format!("/api/v1/reports/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            app,
            Method::PUT,
            &format!("/api/v1/reports/{id}"),
            Some(json!({"summary": "Too late for this one."})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/v1/reports",
            Some(json!({"patientName": "J", "summary": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/reports",
            Some(json!({"patientName": 12, "summary": "Valid summary text."})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_report_dates_are_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/v1/reports",
            Some(json!({
                "patientName": "Emily Davis",
                "summary": "Glucose tolerance test normal.",
                "date": "last tuesday"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Date must be a valid ISO-8601 date");

        let (status, body) = send(
            app.clone(),
            Method::PUT,
            "/api/v1/reports/1",
            Some(json!({"date": "garbage"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (_, body) = send(app, Method::GET, "/api/v1/reports", None).await;
        assert_eq!(body["total"], 5);
        assert_eq!(body["data"][0]["date"], "2025-03-15T10:30:00Z");
    }

    #[tokio::test]
    async fn test_list_with_largest_offset() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let uri = format!("/api/v1/reports?limit=1&offset={}", usize::MAX);
        let (status, body) = send(app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["total"], 5);
        assert_eq!(body["totalPages"], 5);
        assert_eq!(body["page"], json!(usize::MAX));
    }

    #[tokio::test]
    async fn test_alerts_endpoint() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(app, Method::GET, "/api/v1/alerts", None).await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .expect("array body")
            .iter()
            .filter_map(|r| r["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_resource_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(seeded_state(&temp_dir, false));

        let (status, body) = send(app, Method::GET, "/api/v2/nothing", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
        assert_eq!(body["error"]["message"], "Resource not found: /api/v2/nothing");
    }

    #[tokio::test]
    async fn test_cache_serves_reads_and_writes_invalidate() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = seeded_state(&temp_dir, true);
        let app = router(state.clone());

        let (_, first) = send(app.clone(), Method::GET, "/api/v1/reports?limit=2", None).await;
        let (_, second) = send(app.clone(), Method::GET, "/api/v1/reports?limit=2", None).await;
        assert_eq!(first, second);
        let stats = state.cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.keys), (1, 1, 1));

        send(app.clone(), Method::GET, "/api/v1/reports/1", None).await;
        assert_eq!(state.cache.stats().keys, 2);

        let (status, _) = send(app.clone(), Method::DELETE, "/api/v1/reports/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.cache.stats().keys, 0);

        let (status, _) = send(app.clone(), Method::GET, "/api/v1/reports/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(app, Method::GET, "/api/stats/cache", None).await;
        assert_eq!(body["enabled"], true);
        assert_eq!(body["config"]["ttl"], 300);
        assert_eq!(body["config"]["maxItems"], 1000);
        assert_eq!(body["stats"]["keys"], 0);
    }
}
