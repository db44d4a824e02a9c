// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::Provider;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No credential on file; the user must authorize the provider first.
    #[error("{0} account not connected")]
    NotConnected(Provider),

    /// Refresh token absent or rejected; the user must re-consent.
    #[error("{0} authorization expired, please reconnect")]
    ReauthRequired(Provider),

    /// Authorization-code exchange with the provider failed.
    #[error("OAuth code exchange failed: {0}")]
    AuthExchange(String),

    /// Mandatory post-exchange lookup yielded no usable resource.
    #[error("Provider resource resolution failed: {0}")]
    ResourceResolution(String),

    /// Transient provider or network failure on the read path.
    #[error("{provider} API error: {message}")]
    Upstream { provider: Provider, message: String },

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for upstream provider failures.
    pub fn upstream(provider: Provider, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotConnected(_) => {
                (StatusCode::CONFLICT, "not_connected", Some(self.to_string()))
            }
            AppError::ReauthRequired(_) => (
                StatusCode::UNAUTHORIZED,
                "reauth_required",
                Some(self.to_string()),
            ),
            AppError::AuthExchange(msg) => (
                StatusCode::BAD_GATEWAY,
                "auth_exchange_failed",
                Some(msg.clone()),
            ),
            AppError::ResourceResolution(msg) => (
                StatusCode::BAD_GATEWAY,
                "resource_resolution_failed",
                Some(msg.clone()),
            ),
            AppError::Upstream { .. } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                Some(self.to_string()),
            ),
            AppError::InvalidGoal(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_goal", Some(msg.clone()))
            }
            AppError::RecordNotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found", Some(msg.clone()))
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
