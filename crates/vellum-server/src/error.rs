//! Server error type and its HTTP mapping.
//!
//! 500 responses never carry resolver or backend detail; that goes to the
//! log only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use vellum_render::CacheError;
use vellum_store::{ResolutionError, StoreError};

#[derive(Debug, Error)]
pub enum ServerError {
    /// No version was ever recorded under the path. Expected, not a fault.
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("composition cache error: {0}")]
    Cache(#[from] CacheError),

    /// Manual invalidation failed.
    #[error("revalidation failed: {0}")]
    Revalidate(#[source] CacheError),

    /// Event-driven invalidation failed.
    #[error("webhook failed: {0}")]
    Webhook(#[source] CacheError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::NotFound(path) => {
                tracing::debug!(path = %path, "file not found");
                json!({ "message": "File not found" })
            }
            Self::Revalidate(e) => {
                tracing::error!(error = %e, "revalidation failed");
                json!({ "message": "Error revalidating", "error": e.to_string() })
            }
            Self::Webhook(e) => {
                tracing::error!(error = %e, "webhook processing failed");
                json!({ "message": "Error processing webhook", "error": e.to_string() })
            }
            other => {
                tracing::error!(error = %other, "internal server error");
                json!({ "message": "Internal server error" })
            }
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: ServerError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = body_of(ServerError::NotFound("a.txt".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "File not found" }));
    }

    #[tokio::test]
    async fn resolution_detail_is_not_exposed() {
        let err = ServerError::from(ResolutionError::from(StoreError::Connection(
            "10.0.0.5:27017 refused".into(),
        )));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Internal server error" }));

        let (_, body) = body_of(ResolutionError::TimedOut(Duration::from_secs(5)).into()).await;
        assert!(!body.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn revalidation_failures_carry_their_own_message() {
        let (status, body) = body_of(ServerError::Revalidate(CacheError::Poisoned)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error revalidating");
        assert!(body["error"].is_string());

        let (_, body) = body_of(ServerError::Webhook(CacheError::Poisoned)).await;
        assert_eq!(body["message"], "Error processing webhook");
    }
}
