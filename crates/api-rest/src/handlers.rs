//! HTTP handlers for the report API.
//!
//! Handlers translate between wire types and the service layer; all business rules live in
//! `report-core`. The listing and by-id reads go through the response cache when it is
//! enabled, and every write invalidates the cached report responses.

use crate::cache::{ResponseCache, LIST_REPORTS_TTL, REPORTS_KEY_PATTERN, REPORT_BY_ID_TTL};
use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    ApiInfoRes, CacheStatsRes, CreateReportReq, ErrorRes, HealthRes, ReportListRes,
    ReportMessageRes, ReportRes, UpdateReportReq,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::Json;
use report_core::{PaginationParams, ReportFilterParams};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// Reports the service as up, with the current time and the deployment environment.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(state.health.check())
}

#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "API name, version and entry points", body = ApiInfoRes)
    )
)]
#[axum::debug_handler]
pub async fn api_info() -> Json<ApiInfoRes> {
    Json(ApiInfoRes::default())
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(
        ("patientName" = Option<String>, Query, description = "Case-insensitive substring of the patient name"),
        ("patientId" = Option<String>, Query, description = "Exact patient identifier"),
        ("type" = Option<String>, Query, description = "Exact report type"),
        ("fromDate" = Option<String>, Query, description = "Inclusive lower bound on the report date (YYYY-MM-DD or ISO-8601 UTC)"),
        ("toDate" = Option<String>, Query, description = "Inclusive upper bound on the report date (YYYY-MM-DD or ISO-8601 UTC)"),
        ("limit" = Option<String>, Query, description = "Page size, 1 to 100 (default 10)"),
        ("offset" = Option<String>, Query, description = "Number of matches to skip (default 0)"),
        ("sortBy" = Option<String>, Query, description = "date, patientName, type, createdAt or updatedAt (default date)"),
        ("sortDirection" = Option<String>, Query, description = "asc or desc (default desc)")
    ),
    responses(
        (status = 200, description = "One page of matching reports", body = ReportListRes),
        (status = 400, description = "Invalid filter or pagination parameter", body = ErrorRes)
    )
)]
/// List reports
///
/// Filters, sorts and paginates the stored reports. Validation of the raw query values happens
/// in `report-core` before the query runs.
///
/// # Errors
/// Returns `400 Bad Request` if a date bound is malformed, `limit` is outside 1..=100 or
/// `offset` is negative.
#[axum::debug_handler]
pub async fn list_reports(
    State(state): State<AppState>,
    uri: Uri,
    filter: Result<Query<ReportFilterParams>, QueryRejection>,
    pagination: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    read_through(&state, &uri, LIST_REPORTS_TTL, || {
        let Query(filter) = filter?;
        let Query(pagination) = pagination?;
        let filter = filter.into_filter()?;
        let options = pagination.into_options()?;

        tracing::debug!(?filter, ?options, "listing reports");
        let page = state.service.get_reports(Some(&filter), Some(&options));
        Ok(ReportListRes::from(page))
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "The report", body = ReportRes),
        (status = 404, description = "No report with this id", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_report(
    State(state): State<AppState>,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    read_through(&state, &uri, REPORT_BY_ID_TTL, || {
        let report = state.service.get_report_by_id(&id)?;
        Ok(ReportRes::from(report))
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = CreateReportReq,
    responses(
        (status = 201, description = "Report created", body = ReportMessageRes),
        (status = 400, description = "Missing or out-of-range fields", body = ErrorRes)
    )
)]
/// Create a report
///
/// `patientName` (2 to 100 characters) and `summary` (10 to 2000 characters) are required.
/// Missing `date` defaults to now and missing `type` to `General`.
#[axum::debug_handler]
pub async fn create_report(
    State(state): State<AppState>,
    payload: Result<Json<CreateReportReq>, JsonRejection>,
) -> Result<(StatusCode, Json<ReportMessageRes>), ApiError> {
    let Json(req) = payload?;
    let report = state.service.create_report(req.into())?;
    state.cache.invalidate(REPORTS_KEY_PATTERN);
    Ok((StatusCode::CREATED, Json(ReportMessageRes::created(report))))
}

#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id")),
    request_body = UpdateReportReq,
    responses(
        (status = 200, description = "Report updated", body = ReportMessageRes),
        (status = 400, description = "Malformed body", body = ErrorRes),
        (status = 404, description = "No report with this id", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateReportReq>, JsonRejection>,
) -> Result<Json<ReportMessageRes>, ApiError> {
    let Json(req) = payload?;
    let report = state.service.update_report(&id, req.into())?;
    state.cache.invalidate(REPORTS_KEY_PATTERN);
    Ok(Json(ReportMessageRes::updated(report)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 404, description = "No report with this id", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_report(&id)?;
    state.cache.invalidate(REPORTS_KEY_PATTERN);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    responses(
        (status = 200, description = "Reports whose summary mentions a medical alert keyword", body = [ReportRes])
    )
)]
#[axum::debug_handler]
pub async fn list_alerts(State(state): State<AppState>) -> Json<Vec<ReportRes>> {
    let alerts = state
        .service
        .get_reports_with_medical_alerts()
        .into_iter()
        .map(ReportRes::from)
        .collect();
    Json(alerts)
}

#[utoipa::path(
    get,
    path = "/api/stats/cache",
    responses(
        (status = 200, description = "Response cache statistics", body = CacheStatsRes)
    )
)]
#[axum::debug_handler]
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsRes> {
    Json(CacheStatsRes {
        enabled: state.cache.is_enabled(),
        stats: state.cache.stats(),
        config: state.cache.config_res(),
    })
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found_route(&uri.to_string())
}

// Serves a cached body when there is one, otherwise runs `load` and caches its success.
fn read_through<T, F>(
    state: &AppState,
    uri: &Uri,
    ttl: Duration,
    load: F,
) -> Result<Json<Value>, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Result<T, ApiError>,
{
    if !state.cache.is_enabled() {
        return Ok(Json(to_body(load()?)?));
    }

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let key = ResponseCache::key("GET", path_and_query);

    if let Some(body) = state.cache.get(&key) {
        tracing::debug!("cache hit for {key}");
        return Ok(Json(body));
    }

    let body = to_body(load()?)?;
    state.cache.set(key, body.clone(), ttl);
    Ok(Json(body))
}

fn to_body<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!("failed to serialise response: {:?}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An unexpected error occurred",
        )
    })
}
