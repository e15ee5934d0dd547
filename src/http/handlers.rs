//! Route handlers.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::game::types::{PayWinnerRequest, StakeRequest};
use crate::http::response::{finish, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;

pub const SERVICE_NAME: &str = "wager-relay";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn stake_game(
    State(state): State<AppState>,
    payload: Result<Json<StakeRequest>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(req) = payload.map_err(reject_body)?;
        validate_stake_request(&req)?;
        Ok::<_, ApiError>(state.service.stake_game(&req).await?)
    }
    .await;
    finish("stake", result)
}

pub async fn pay_winner(
    State(state): State<AppState>,
    payload: Result<Json<PayWinnerRequest>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(req) = payload.map_err(reject_body)?;
        validate_pay_winner_request(&req)?;
        Ok::<_, ApiError>(state.service.pay_winner(&req).await?)
    }
    .await;
    finish("pay_winner", result)
}

pub async fn stake_history(State(state): State<AppState>, Path(address): Path<String>) -> Response {
    let result = async {
        validate_sui_address(&address).map_err(|e| ApiError::bad_request(format!("Invalid address format: {}", e)))?;
        Ok::<_, ApiError>(state.service.stake_history(&address).await?)
    }
    .await;
    finish("stake_history", result)
}

pub async fn game_history(State(state): State<AppState>, Path(address): Path<String>) -> Response {
    let result = async {
        validate_sui_address(&address).map_err(|e| ApiError::bad_request(format!("Invalid address format: {}", e)))?;
        Ok::<_, ApiError>(state.service.game_history(&address).await?)
    }
    .await;
    finish("game_history", result)
}

pub async fn game_stats(State(state): State<AppState>) -> Response {
    let result = async { Ok::<_, ApiError>(state.service.game_stats().await?) }.await;
    finish("game_stats", result)
}

/// Checks the node; 503 while it is unreachable.
pub async fn health(State(state): State<AppState>) -> Response {
    let healthy = state.service.chain().is_healthy().await;
    let (status, body) = if healthy {
        (
            StatusCode::OK,
            json!({
                "success": true,
                "status": "healthy",
                "service": SERVICE_NAME,
                "chain": "connected",
                "timestamp": unix_now(),
                "version": VERSION,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "success": false,
                "status": "degraded",
                "service": SERVICE_NAME,
                "chain": "unreachable",
                "timestamp": unix_now(),
                "version": VERSION,
            }),
        )
    };
    metrics::record_http_request("health", status.as_u16());
    (status, Json(body)).into_response()
}

pub async fn info(State(state): State<AppState>) -> Response {
    let body = json!({
        "success": true,
        "info": {
            "service": SERVICE_NAME,
            "version": VERSION,
            "environment": &*state.environment,
            "network": &*state.rpc_url,
            "module": &*state.module_name,
            "signer": state.service.chain().signer_address(),
            "endpoints": {
                "stake": "POST /api/v1/games/stake",
                "pay_winner": "POST /api/v1/games/pay_winner",
                "stake_history": "GET /api/v1/games/stakes/{address}",
                "game_history": "GET /api/v1/games/history/{address}",
                "stats": "GET /api/v1/games/stats",
                "health": "GET /health",
            },
        },
    });
    metrics::record_http_request("info", 200);
    Json(body).into_response()
}

pub async fn status(State(state): State<AppState>) -> Response {
    let body = json!({
        "success": true,
        "service": SERVICE_NAME,
        "version": VERSION,
        "environment": &*state.environment,
        "timestamp": unix_now(),
        "uptime_secs": state.started.elapsed().as_secs(),
    });
    metrics::record_http_request("status", 200);
    Json(body).into_response()
}

pub async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::debug!(method = %method, path = %uri.path(), "No route matched");
    metrics::record_http_request("not_found", 404);
    let body = json!({
        "success": false,
        "error": "Endpoint not found",
        "path": uri.path(),
        "method": method.as_str(),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(format!("Invalid request format: {}", rejection.body_text()))
}

pub fn validate_stake_request(req: &StakeRequest) -> Result<(), ApiError> {
    if req.requester_coin_id.is_empty() {
        return Err(ApiError::bad_request("requester_coin_id is required"));
    }
    if req.accepter_coin_id.is_empty() {
        return Err(ApiError::bad_request("accepter_coin_id is required"));
    }
    validate_participants(&req.requester_address, &req.accepter_address, req.stake_amount)
}

pub fn validate_pay_winner_request(req: &PayWinnerRequest) -> Result<(), ApiError> {
    validate_participants(&req.requester_address, &req.accepter_address, req.stake_amount)
        .map_err(|e| ApiError::bad_request(format!("Validation failed: {}", e.message)))
}

fn validate_participants(requester: &str, accepter: &str, stake_amount: u64) -> Result<(), ApiError> {
    if requester.is_empty() {
        return Err(ApiError::bad_request("requester_address is required"));
    }
    if accepter.is_empty() {
        return Err(ApiError::bad_request("accepter_address is required"));
    }
    if stake_amount == 0 {
        return Err(ApiError::bad_request("stake_amount must be greater than 0"));
    }
    if requester == accepter {
        return Err(ApiError::bad_request(
            "requester and accepter addresses cannot be the same",
        ));
    }
    validate_sui_address(requester)
        .map_err(|e| ApiError::bad_request(format!("invalid requester_address: {}", e)))?;
    validate_sui_address(accepter)
        .map_err(|e| ApiError::bad_request(format!("invalid accepter_address: {}", e)))?;
    Ok(())
}

/// `0x`-prefixed hex, 40 to 66 characters including the prefix.
pub fn validate_sui_address(address: &str) -> Result<(), &'static str> {
    if address.len() < 40 || address.len() > 66 {
        return Err("invalid address length");
    }
    let Some(hex_part) = address.strip_prefix("0x") else {
        return Err("address must start with 0x");
    };
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("address contains invalid characters");
    }
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
