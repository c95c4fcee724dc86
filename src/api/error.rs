//! Translation of upstream failures into JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Per-route wording for the two messages that differ between routes.
#[derive(Debug, Clone, Copy)]
pub struct RouteMessages {
    pub not_found: &'static str,
    pub failure: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to connect to API server")]
    Unavailable,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: &'static str,
    },
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Classify an upstream failure, logging it with full context.
    pub fn from_upstream(err: UpstreamError, messages: RouteMessages) -> Self {
        match err {
            UpstreamError::Unavailable(source) => {
                tracing::error!(error = %source, "{}: upstream unreachable", messages.failure);
                ApiError::Unavailable
            }
            UpstreamError::NotFound => ApiError::NotFound(messages.not_found),
            UpstreamError::Status { status } => {
                tracing::error!(%status, "{}: upstream error status", messages.failure);
                ApiError::Upstream {
                    status,
                    message: messages.failure,
                }
            }
            UpstreamError::Decode(source) => {
                tracing::error!(error = ?source, "{}: malformed upstream response", messages.failure);
                ApiError::Internal(messages.failure)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
