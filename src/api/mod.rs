//! API layer -- axum routes, handlers, and middleware.

pub mod error;
mod routes;
pub mod state;

use self::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router: pages, `/api/*` proxy routes, and static assets.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.pages.max_body_bytes).unwrap_or(usize::MAX);
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(routes::index))
        .route("/ide", get(routes::ide))
        .route("/health", get(routes::health))
        .nest("/api", routes::api_routes())
        .nest_service("/static", assets)
        .fallback(fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn fallback() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
