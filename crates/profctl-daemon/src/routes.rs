//! Axum router and HTTP handlers for `profctl-daemon`.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Every handler is a thin adapter: decode JSON/query
//! params into a `profctl-schemas` type, call the matching `profctl-core`
//! operation, map `CoreError` onto an HTTP status. No business logic lives
//! here — that's the whole point of keeping this crate thin.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use profctl_schemas::{
    HeartbeatRequest, HostStatusFilters, NewProfilingRequest, ReportCompletionRequest,
    SubmitBulkRequest,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/profiling/requests", post(submit_request))
        .route("/v1/profiling/requests/bulk", post(submit_bulk_requests))
        .route("/v1/heartbeat", post(heartbeat))
        .route("/v1/profiling/completions", post(report_completion))
        .route("/v1/profiling/hosts", get(list_host_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    version: &'static str,
}

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = profctl_db::status(&st.pool).await.map(|s| s.ok).unwrap_or(false);
    let code = if db_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        code,
        Json(HealthResponse {
            ok: db_ok,
            service: "profctl-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/profiling/requests
// ---------------------------------------------------------------------------

pub(crate) async fn submit_request(
    State(st): State<Arc<AppState>>,
    Json(req): Json<NewProfilingRequest>,
) -> Response {
    match profctl_core::submit_profiling_request(&st.pool, &st.config, &req).await {
        Ok(resp) => {
            info!(request_id = %resp.request_id, commands = resp.command_ids.len(), "request submitted");
            (StatusCode::CREATED, Json(resp)).into_response()
        }
        Err(err) => core_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/profiling/requests/bulk
// ---------------------------------------------------------------------------

pub(crate) async fn submit_bulk_requests(
    State(st): State<Arc<AppState>>,
    Json(batch): Json<SubmitBulkRequest>,
) -> Response {
    match profctl_core::submit_bulk_profiling_requests(&st.pool, &st.config, &batch).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => core_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/heartbeat
// ---------------------------------------------------------------------------

pub(crate) async fn heartbeat(
    State(st): State<Arc<AppState>>,
    Json(req): Json<HeartbeatRequest>,
) -> Response {
    match profctl_core::heartbeat(&st.pool, &req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => core_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/profiling/completions
// ---------------------------------------------------------------------------

pub(crate) async fn report_completion(
    State(st): State<Arc<AppState>>,
    Json(req): Json<ReportCompletionRequest>,
) -> Response {
    match profctl_core::report_command_completion(&st.pool, &req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => core_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/profiling/hosts
// ---------------------------------------------------------------------------

pub(crate) async fn list_host_status(
    State(st): State<Arc<AppState>>,
    Query(filters): Query<HostStatusFilters>,
) -> Response {
    match profctl_core::list_host_profiling_status(&st.pool, &filters).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => core_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn core_error_response(err: profctl_core::CoreError) -> Response {
    use profctl_core::CoreError;

    let (status, log_level) = match &err {
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "info"),
        CoreError::Capacity(_) => (StatusCode::CONFLICT, "info"),
        CoreError::Conflict(_) => (StatusCode::CONFLICT, "warn"),
        CoreError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "warn"),
        CoreError::Fatal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
    };

    match log_level {
        "error" => error!(error = %err, "request failed"),
        "warn" => warn!(error = %err, "request failed"),
        _ => info!(error = %err, "request rejected"),
    }

    (status, Json(ErrorBody { error: err.to_string() })).into_response()
}
