//! execdash -- dashboard backend for a remote code-execution API.
//!
//! Renders the dashboard and IDE pages, proxies runtime, execution, process
//! and metrics calls to the upstream API, and serves the execution history
//! sorted and paginated.

pub mod api;
pub mod config;
pub mod history;
pub mod pages;
pub mod upstream;

use anyhow::{Context, Result};

use crate::api::state::AppState;
use crate::config::DashboardConfig;
use crate::pages::PageContext;
use crate::upstream::UpstreamClient;

/// Build the shared application state from a resolved configuration.
pub fn app_state(config: &DashboardConfig) -> Result<AppState> {
    let upstream = UpstreamClient::new(&config.upstream)?;
    let pages = PageContext {
        upstream: upstream.base_url().to_string(),
        started_at: chrono::Utc::now().to_rfc3339(),
        max_body_bytes: config.server.max_body_bytes,
    };

    Ok(AppState {
        upstream,
        pages,
        static_dir: config.server.static_dir.clone(),
    })
}

/// Start the dashboard HTTP server and run until the listener fails.
pub async fn serve(config: DashboardConfig) -> Result<()> {
    let state = app_state(&config)?;
    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.server.bind))?;

    let app = api::router(state);

    tracing::info!(%addr, upstream = %config.upstream.base_url, "execdash listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind TCP listener on {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
