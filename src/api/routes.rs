//! API route definitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::error::{ApiError, RouteMessages};
use super::state::AppState;
use crate::history::{self, HistoryQuery, PageResult};
use crate::pages;

const RUNTIMES: RouteMessages = RouteMessages {
    not_found: "Resource not found",
    failure: "Failed to fetch runtimes",
};
const EXECUTE: RouteMessages = RouteMessages {
    not_found: "Resource not found",
    failure: "Failed to execute code",
};
const METRICS: RouteMessages = RouteMessages {
    not_found: "Resource not found",
    failure: "Failed to fetch metrics",
};
const PROCESS_TIMING: RouteMessages = RouteMessages {
    not_found: "Process not found",
    failure: "Failed to fetch process timing",
};
const PROCESS_INFO: RouteMessages = RouteMessages {
    not_found: "Process not found",
    failure: "Failed to fetch process info",
};
const TERMINATE: RouteMessages = RouteMessages {
    not_found: "Process not found",
    failure: "Failed to terminate process",
};
const EXECUTION_DETAILS: RouteMessages = RouteMessages {
    not_found: "Execution not found",
    failure: "Failed to fetch execution details",
};

const HISTORY_UNAVAILABLE: &str = "Failed to fetch history data";

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/runtimes", get(runtimes))
        .route("/execute", post(execute))
        .route("/metrics", get(metrics))
        .route("/process/{id}/timing", get(process_timing))
        .route("/process/{id}", get(process_info).delete(terminate_process))
        .route("/history", get(list_history))
        .route("/history/{id}", get(execution_details))
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

pub(super) async fn index(State(state): State<AppState>) -> Response {
    tracing::debug!("rendering index page");
    html_page(pages::render_index(&state.pages), "index")
}

pub(super) async fn ide(State(state): State<AppState>) -> Response {
    tracing::debug!("rendering IDE page");
    html_page(pages::render_ide(&state.pages), "ide")
}

fn html_page(rendered: askama::Result<String>, page: &'static str) -> Response {
    match rendered {
        Ok(body) => Html(body).into_response(),
        Err(error) => {
            tracing::error!(page, error = ?error, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Upstream proxies
// ---------------------------------------------------------------------------

async fn runtimes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let body = state
        .upstream
        .runtimes()
        .await
        .map_err(|e| ApiError::from_upstream(e, RUNTIMES))?;
    Ok(Json(body))
}

async fn execute(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(language = ?request.get("language"), "executing code");
    let body = state
        .upstream
        .execute(&request)
        .await
        .map_err(|e| ApiError::from_upstream(e, EXECUTE))?;
    Ok(Json(body))
}

async fn metrics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let body = state
        .upstream
        .metrics()
        .await
        .map_err(|e| ApiError::from_upstream(e, METRICS))?;
    Ok(Json(body))
}

async fn process_timing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(process_id = %id, "fetching process timing");
    let body = state
        .upstream
        .process_timing(&id)
        .await
        .map_err(|e| ApiError::from_upstream(e, PROCESS_TIMING))?;
    Ok(Json(body))
}

async fn process_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(process_id = %id, "fetching process info");
    let body = state
        .upstream
        .process_info(&id)
        .await
        .map_err(|e| ApiError::from_upstream(e, PROCESS_INFO))?;
    Ok(Json(body))
}

async fn terminate_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(process_id = %id, "terminating process");
    state
        .upstream
        .terminate_process(&id)
        .await
        .map_err(|e| ApiError::from_upstream(e, TERMINATE))?;
    Ok(Json(json!({ "message": "Process terminated successfully" })))
}

/// Sorted, paginated execution history.
///
/// Any upstream failure yields a 503 carrying an empty placeholder page, so
/// the dashboard table can still render.
async fn list_history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Response {
    let request = query.page_request();
    tracing::debug!(
        page = request.page,
        limit = request.limit,
        sort_by = %request.sort_by,
        order = %request.order,
        "fetching history"
    );

    match state.upstream.fetch_history().await {
        Ok(records) => Json(history::assemble(records, &request)).into_response(),
        Err(error) => {
            tracing::error!(error = ?error, "history fetch failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(PageResult::unavailable(HISTORY_UNAVAILABLE)),
            )
                .into_response()
        }
    }
}

async fn execution_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let body = state
        .upstream
        .execution_details(&id)
        .await
        .map_err(|e| ApiError::from_upstream(e, EXECUTION_DETAILS))?;
    Ok(Json(body))
}
