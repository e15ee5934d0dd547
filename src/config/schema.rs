//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the wager relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment label ("development", "production").
    pub environment: String,

    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Sui chain and contract settings.
    pub chain: ChainConfig,

    /// Mirror record storage.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            chain: ChainConfig::default(),
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 64 * 1024,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    ///
    /// Must exceed the chain RPC timeout, since one stake makes several calls.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Sui chain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Published package holding the wager module.
    pub package_id: String,

    /// Move module name inside the package.
    pub module_name: String,

    /// Shared liquidity pool object.
    pub pool_id: String,

    /// Currency type staked and used for gas.
    pub coin_type: String,

    /// Baseline gas budget in MIST.
    pub gas_budget: u64,

    /// Gas budget for stakes that select their own payment coins.
    pub auto_stake_gas_budget: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Coins requested per `suix_getCoins` page.
    pub coin_page_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://fullnode.testnet.sui.io:443".to_string(),
            package_id: String::new(),
            module_name: "wager_pool".to_string(),
            pool_id: String::new(),
            coin_type: "0x2::sui::SUI".to_string(),
            gas_budget: 10_000_000,
            auto_stake_gas_budget: 20_000_000,
            rpc_timeout_secs: 30,
            coin_page_size: 50,
        }
    }
}

/// Mirror record storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file the in-memory store loads from and flushes to.
    pub persistence_path: Option<String>,

    /// Maximum records returned by a history query.
    pub history_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persistence_path: None,
            history_limit: 50,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,

    /// Answer CORS preflights and allow any origin.
    pub enable_cors: bool,

    /// Shared key checked against `X-API-Key` or the `api_key` query parameter.
    ///
    /// Usually supplied through `WAGER_API_KEY` rather than the file.
    pub api_key: Option<String>,

    /// Reject requests that carry no key at all.
    ///
    /// When false, only a wrong key is rejected.
    pub api_key_required: bool,

    /// Requests per minute allowed per client IP (0 disables limiting).
    pub rate_limit_per_minute: u32,

    /// Seconds a client bucket may sit unused before it is evicted.
    pub rate_limit_idle_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            enable_cors: true,
            api_key: None,
            api_key_required: false,
            rate_limit_per_minute: 100,
            rate_limit_idle_secs: 180,
        }
    }
}

impl SecurityConfig {
    /// The configured key, ignoring a blank value.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}
