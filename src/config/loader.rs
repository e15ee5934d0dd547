//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_RPC_URL: &str = "WAGER_RPC_URL";
pub const ENV_PACKAGE_ID: &str = "WAGER_PACKAGE_ID";
pub const ENV_POOL_ID: &str = "WAGER_POOL_ID";
pub const ENV_MODULE_NAME: &str = "WAGER_MODULE_NAME";
pub const ENV_BIND_ADDRESS: &str = "WAGER_BIND_ADDRESS";
pub const ENV_API_KEY: &str = "WAGER_API_KEY";
pub const ENV_RATE_LIMIT: &str = "WAGER_RATE_LIMIT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply environment overrides, then validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config = parse_config(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus environment overrides, for deployments without a file.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Overlay non-empty values returned by `lookup` onto `config`.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_RPC_URL) {
        config.chain.rpc_url = v;
    }
    if let Some(v) = get(ENV_PACKAGE_ID) {
        config.chain.package_id = v;
    }
    if let Some(v) = get(ENV_POOL_ID) {
        config.chain.pool_id = v;
    }
    if let Some(v) = get(ENV_MODULE_NAME) {
        config.chain.module_name = v;
    }
    if let Some(v) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = v;
    }
    if let Some(v) = get(ENV_API_KEY) {
        config.security.api_key = Some(v);
    }
    if let Some(v) = get(ENV_RATE_LIMIT) {
        match v.trim().parse() {
            Ok(limit) => config.security.rate_limit_per_minute = limit,
            Err(_) => tracing::warn!(variable = ENV_RATE_LIMIT, value = %v, "Ignoring non-numeric override"),
        }
    }
}
