//! Client for the remote code-execution API.
//!
//! Every call returns the upstream JSON untouched or an [`UpstreamError`]
//! saying which way it failed; the route layer decides the HTTP status.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::history::ExecutionRecord;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, timeout, or the body could not be read.
    #[error("upstream unreachable: {0}")]
    Unavailable(#[source] reqwest::Error),
    #[error("upstream resource not found")]
    NotFound,
    #[error("upstream returned {status}")]
    Status { status: StatusCode },
    #[error("malformed upstream response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Handle to the upstream API. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    base: Url,
    execute_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build upstream HTTP client")?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .with_context(|| format!("invalid upstream base URL: {}", config.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("upstream base URL has no path: {}", config.base_url);
        }

        Ok(Self {
            client,
            base_url,
            base,
            execute_timeout: config.execute_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Append `segments` to the base path, each one percent-encoded as a
    /// single segment. A `/`, `?` or `#` inside an id never leaves its segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // new() rejected cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET /runtimes` -- languages and versions the runner supports.
    pub async fn runtimes(&self) -> Result<Value, UpstreamError> {
        self.send_json(self.client.get(self.url(&["runtimes"]))).await
    }

    /// `POST /execute` with the caller's body passed through verbatim.
    pub async fn execute(&self, body: &Value) -> Result<Value, UpstreamError> {
        let request = self
            .client
            .post(self.url(&["execute"]))
            .timeout(self.execute_timeout)
            .json(body);
        self.send_json(request).await
    }

    pub async fn metrics(&self) -> Result<Value, UpstreamError> {
        self.send_json(self.client.get(self.url(&["metrics"]))).await
    }

    pub async fn process_timing(&self, process_id: &str) -> Result<Value, UpstreamError> {
        let url = self.url(&["process", resource_id(process_id)?, "timing"]);
        self.send_json(self.client.get(url)).await
    }

    pub async fn process_info(&self, process_id: &str) -> Result<Value, UpstreamError> {
        let url = self.url(&["process", resource_id(process_id)?]);
        self.send_json(self.client.get(url)).await
    }

    /// `DELETE /process/{id}`. The response body is ignored.
    pub async fn terminate_process(&self, process_id: &str) -> Result<(), UpstreamError> {
        let url = self.url(&["process", resource_id(process_id)?]);
        self.send(self.client.delete(url)).await.map(|_| ())
    }

    /// `GET /history` -- the full, unordered execution history.
    ///
    /// A body that is not a JSON array counts as an empty history, and
    /// array elements that are not objects are dropped.
    pub async fn fetch_history(&self) -> Result<Vec<ExecutionRecord>, UpstreamError> {
        let body = self.send_json(self.client.get(self.url(&["history"]))).await?;
        Ok(history_records(body))
    }

    pub async fn execution_details(&self, execution_id: &str) -> Result<Value, UpstreamError> {
        let url = self.url(&["history", resource_id(execution_id)?]);
        self.send_json(self.client.get(url)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
        let response = request.send().await.map_err(UpstreamError::Unavailable)?;
        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "upstream response");

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound);
        }
        if !status.is_success() {
            return Err(UpstreamError::Status { status });
        }
        Ok(response)
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let response = self.send(request).await?;
        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                UpstreamError::Decode(e)
            } else {
                UpstreamError::Unavailable(e)
            }
        })
    }
}

/// Ids that cannot name a resource are reported as missing without asking
/// the upstream; `.` and `..` would otherwise be dropped from the path.
fn resource_id(id: &str) -> Result<&str, UpstreamError> {
    if id.is_empty() || id == "." || id == ".." {
        tracing::debug!(id, "rejecting unusable resource id");
        return Err(UpstreamError::NotFound);
    }
    Ok(id)
}

fn history_records(body: Value) -> Vec<ExecutionRecord> {
    match body {
        Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
