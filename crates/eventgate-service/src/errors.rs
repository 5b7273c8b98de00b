//! HTTP-facing error types for the service.
//!
//! [`ApiError`] wraps [`eventgate_core::EventGateError`] and maps it onto an
//! HTTP status code and JSON body carrying the stable machine code from
//! §7's taxonomy, a human message, and the request's correlation id.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use eventgate_core::{CorrelationId, ErrorCategory, EventGateError};
use tracing::{error, warn};

/// HTTP-facing wrapper around [`EventGateError`].
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct ApiError {
    #[source]
    pub source: EventGateError,
    pub correlation_id: CorrelationId,
}

impl ApiError {
    pub fn new(source: EventGateError, correlation_id: CorrelationId) -> Self {
        Self {
            source,
            correlation_id,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.source.error_category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
            ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::TransientStore | ErrorCategory::TransientNetwork => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.source, correlation_id = %self.correlation_id, "internal error");
            "Internal server error occurred. Please try again later.".to_string()
        } else {
            warn!(error = %self.source, code = self.source.code(), correlation_id = %self.correlation_id, "request failed");
            self.source.to_string()
        };

        let body = serde_json::json!({
            "error": {
                "code": self.source.code(),
                "message": message,
            },
            "correlation_id": self.correlation_id.to_string(),
        });

        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            "X-Correlation-ID",
            self.correlation_id
                .to_string()
                .parse()
                .expect("uuid string is a valid header value"),
        );

        if let EventGateError::RateLimited { retry_after_secs } = &self.source {
            if let Ok(header_value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert("Retry-After", header_value);
            }
        }

        response
    }
}

/// Errors encountered starting or supervising the HTTP service itself.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration loading/validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}
