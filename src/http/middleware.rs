//! Admission middleware and the error handler for fallible layers.
//!
//! Every refusal uses the `{"success": false, "error": ...}` body.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tower::BoxError;

use crate::http::response::{finish, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::access_control::presented_key;
use crate::security::KeyCheck;

/// Peer address from the connection; loopback when served without one.
fn client_ip(request: &Request<Body>) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let Some(limiter) = &state.limiter else {
        return next.run(request).await;
    };

    let client = client_ip(&request);
    if limiter.check(client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        metrics::record_rate_limited();
        finish(
            "rate_limited",
            Err::<(), _>(ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        )
    }
}

pub async fn require_api_key(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let Some(policy) = &state.api_key else {
        return next.run(request).await;
    };

    let presented = presented_key(request.headers(), request.uri().query());
    let message = match policy.check(presented.as_deref()) {
        KeyCheck::Allowed => return next.run(request).await,
        KeyCheck::Missing => "API key required",
        KeyCheck::Invalid => "Invalid API key",
    };
    tracing::warn!(path = %request.uri().path(), reason = message, "Request refused");
    finish("unauthorized", Err::<(), _>(ApiError::new(StatusCode::UNAUTHORIZED, message)))
}

/// Maps errors from the timeout layer into JSON responses.
pub async fn handle_layer_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        finish(
            "timeout",
            Err::<(), _>(ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request timeout")),
        )
    } else {
        finish(
            "layer_error",
            Err::<(), _>(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unhandled internal error: {}", err),
            )),
        )
    }
}
