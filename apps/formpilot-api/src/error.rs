//! Error types for the draft store API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Draft not found: {0}")]
    DraftNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Draft has {0} blocking validation error(s)")]
    CompletionBlocked(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::DraftNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Draft not found: {}", id))
            }
            ApiError::VersionNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Version not found: {}", id))
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::CompletionBlocked(count) => (
                StatusCode::CONFLICT,
                format!("Draft has {} blocking validation error(s)", count),
            ),
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
