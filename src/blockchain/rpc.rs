//! JSON-RPC 2.0 transport.
//!
//! # Responsibilities
//! - Serialize the request envelope and POST it to the configured node
//! - Bound every call with a timeout
//! - Keep node-reported errors apart from network and decoding failures
//!
//! No retries happen here; retry policy belongs to callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainError, ChainResult};

/// A single round trip to a JSON-RPC node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `method` with positional `params` and return the raw `result`.
    async fn call(&self, method: &str, params: Vec<Value>) -> ChainResult<Value>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTPS transport bound to one node endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: url::Url,
    timeout_duration: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for `rpc_url` with a per-call timeout.
    pub fn new(rpc_url: &str, timeout_secs: u64) -> ChainResult<Self> {
        let endpoint: url::Url = rpc_url.parse().map_err(|e| {
            ChainError::Transport(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ChainError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            timeout_duration: Duration::from_secs(timeout_secs),
            next_id: AtomicU64::new(1),
        })
    }

    async fn round_trip(&self, body: &RpcRequest<'_>) -> ChainResult<RpcResponse> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChainError::Transport(format!("failed to read body: {}", e)))?;

        match serde_json::from_slice::<RpcResponse>(&bytes) {
            Ok(decoded) => Ok(decoded),
            Err(_) if !status.is_success() => {
                Err(ChainError::Transport(format!("node returned HTTP {}", status)))
            }
            Err(e) => Err(ChainError::Transport(format!("malformed response body: {}", e))),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> ChainResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!(method = method, id = id, "RPC call");

        let decoded = match timeout(self.timeout_duration, self.round_trip(&body)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(method = method, "RPC timeout");
                return Err(ChainError::Timeout(self.timeout_duration.as_secs()));
            }
        };

        if let Some(err) = decoded.error {
            return Err(ChainError::RemoteRpc {
                code: err.code,
                message: err.message,
            });
        }

        decoded
            .result
            .ok_or_else(|| ChainError::Decode(format!("{} returned neither result nor error", method)))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let err = HttpTransport::new("not a url", 5).unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[test]
    fn test_envelope_shape() {
        let req = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "suix_getCoins",
            params: vec![Value::from("0xabc")],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "suix_getCoins");
        assert_eq!(value["params"][0], "0xabc");
    }

    #[test]
    fn test_error_envelope_decoding() {
        let raw = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#;
        let decoded: RpcResponse = serde_json::from_slice(raw).unwrap();
        let err = decoded.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "Invalid params");
        assert!(decoded.result.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let transport = HttpTransport::new("http://127.0.0.1:9", 2).unwrap();
        let err = transport.call("suix_getCurrentEpoch", vec![]).await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_) | ChainError::Timeout(_)));
    }
}
