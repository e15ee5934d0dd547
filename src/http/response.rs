//! Response shaping and error-to-status mapping.
//!
//! # Status Mapping
//! - Local validation failures → 400 Bad Request
//! - Chain failures (transport, RPC, on-chain status) → 502 Bad Gateway
//! - Storage failures on reads → 500 Internal Server Error
//! - Missing or wrong API key → 401, rate limit → 429, request timeout → 408
//!
//! Every failure body is `{"success": false, "error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::game::service::ServiceError;
use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Chain(e) if e.is_local() => StatusCode::BAD_REQUEST,
            ServiceError::Chain(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Serialize `result` and count it under `route`.
pub fn finish<T: Serialize>(route: &'static str, result: Result<T, ApiError>) -> Response {
    let response = match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            if err.status.is_server_error() {
                tracing::error!(route = route, status = %err.status, error = %err.message, "Request failed");
            } else {
                tracing::debug!(route = route, status = %err.status, error = %err.message, "Request rejected");
            }
            err.into_response()
        }
    };
    metrics::record_http_request(route, response.status().as_u16());
    response
}
