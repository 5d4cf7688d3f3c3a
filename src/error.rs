//! Error types for the gateway

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors produced by the registry, the backend clients and the delivery path
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Backend unreachable or its liveness probe failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Backend does not expose a usable max batch size
    #[error("Backend configuration error: {0}")]
    BackendConfig(String),

    /// Backend reports a max batch size below 1
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(String),

    #[error("Backend '{0}' already exists")]
    DuplicateBackend(String),

    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// A prediction call failed mid-flight
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Delivery queue is full")]
    QueueFull,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Connection(_)
            | AppError::BackendConfig(_)
            | AppError::InvalidBatchSize(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateBackend(_) => StatusCode::CONFLICT,
            AppError::BackendNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Backend(_) | AppError::Delivery(_) => StatusCode::BAD_GATEWAY,
            AppError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "connection_error",
            AppError::BackendConfig(_) => "backend_config_error",
            AppError::InvalidBatchSize(_) => "invalid_batch_size",
            AppError::DuplicateBackend(_) => "duplicate_backend",
            AppError::BackendNotFound(_) => "backend_not_found",
            AppError::Backend(_) => "backend_error",
            AppError::Delivery(_) => "delivery_error",
            AppError::QueueFull => "queue_full",
            AppError::Config(_) => "config_error",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
