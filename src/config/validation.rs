//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Contract identifiers are present
//! - Validate value ranges (timeouts > 0, page sizes > 0)
//! - Addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let chain = &config.chain;

    if chain.package_id.trim().is_empty() {
        errors.push(ValidationError::new("chain.package_id", "is required"));
    }
    if chain.pool_id.trim().is_empty() {
        errors.push(ValidationError::new("chain.pool_id", "is required"));
    }
    if chain.module_name.trim().is_empty() {
        errors.push(ValidationError::new("chain.module_name", "must not be empty"));
    }
    if chain.coin_type.trim().is_empty() {
        errors.push(ValidationError::new("chain.coin_type", "must not be empty"));
    }
    match url::Url::parse(&chain.rpc_url) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        Ok(u) => errors.push(ValidationError::new(
            "chain.rpc_url",
            format!("unsupported scheme '{}'", u.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("chain.rpc_url", e.to_string())),
    }
    if chain.gas_budget == 0 {
        errors.push(ValidationError::new("chain.gas_budget", "must be greater than 0"));
    }
    if chain.auto_stake_gas_budget == 0 {
        errors.push(ValidationError::new(
            "chain.auto_stake_gas_budget",
            "must be greater than 0",
        ));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }
    if chain.coin_page_size == 0 {
        errors.push(ValidationError::new("chain.coin_page_size", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.storage.history_limit == 0 {
        errors.push(ValidationError::new("storage.history_limit", "must be greater than 0"));
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }
    if config.security.api_key_required && config.security.api_key().is_none() {
        errors.push(ValidationError::new(
            "security.api_key",
            "is required when api_key_required is set",
        ));
    }
    if config.security.rate_limit_per_minute > 0 && config.security.rate_limit_idle_secs == 0 {
        errors.push(ValidationError::new(
            "security.rate_limit_idle_secs",
            "must be greater than 0 while rate limiting is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.chain.package_id = "0xpkg".into();
        config.chain.pool_id = "0xpool".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_defaults_miss_contract_ids() {
        let errors = validate_config(&AppConfig::default()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["chain.package_id", "chain.pool_id"]);
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid();
        config.chain.rpc_url = "not a url".into();
        config.chain.rpc_timeout_secs = 0;
        config.storage.history_limit = 0;
        config.listener.bind_address = "localhost".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = valid();
        config.chain.rpc_url = "ws://fullnode.example:443".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "chain.rpc_url");
        assert!(errors[0].message.contains("ws"));
    }

    #[test]
    fn test_required_api_key_needs_a_key() {
        let mut config = valid();
        config.security.api_key_required = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "security.api_key");

        config.security.api_key = Some("k".into());
        assert!(validate_config(&config).is_ok());
    }
}
