//! Error types for fabula-web
//!
//! Handler failures render as JSON: `{"message": ...}` for plain errors,
//! `{"errors": {field: message}}` for validation failures. These are the
//! shapes the client pages read.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// Web handler error type
#[derive(Debug, Error)]
pub enum WebError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Authentication required or failed (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("{0}")]
    Conflict(String),

    /// Rate limit exceeded (429)
    #[error("{0}")]
    TooManyRequests(String),

    /// Upstream dependency unavailable (503)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// Per-field validation failure (400, `{"errors": {...}}` body)
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// fabula-common error
    #[error(transparent)]
    Common(#[from] fabula_common::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        // Common errors keep their status semantics instead of collapsing to 500
        if let WebError::Common(err) = self {
            return match err {
                fabula_common::Error::NotFound(msg) => WebError::NotFound(msg).into_response(),
                fabula_common::Error::InvalidInput(msg) => {
                    WebError::BadRequest(msg).into_response()
                }
                other => WebError::Internal(other.to_string()).into_response(),
            };
        }

        if let WebError::Validation(fields) = self {
            return (StatusCode::BAD_REQUEST, Json(json!({ "errors": fields }))).into_response();
        }

        let (status, message) = match self {
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            WebError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            WebError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            WebError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            WebError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            WebError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            WebError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            WebError::Other(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            WebError::Common(_) | WebError::Validation(_) => unreachable!(),
        };

        if status.is_server_error() {
            error!("Request failed with {}: {}", status, message);
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type for web handlers
pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_body_shape() {
        let response = WebError::NotFound("Series not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Series not found");
    }

    #[tokio::test]
    async fn test_validation_body_shape() {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Title is required".to_string());
        let response = WebError::Validation(fields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errors"]["title"], "Title is required");
    }

    #[tokio::test]
    async fn test_common_not_found_maps_to_404() {
        let err = WebError::Common(fabula_common::Error::NotFound("gone".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
