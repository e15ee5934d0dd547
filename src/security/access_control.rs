//! Shared API key check.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::config::schema::SecurityConfig;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY: &str = "api_key";

/// Outcome of checking a presented key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    Allowed,
    Missing,
    Invalid,
}

#[derive(Clone)]
pub struct ApiKeyPolicy {
    key: Arc<str>,
    required: bool,
}

impl ApiKeyPolicy {
    /// `None` when no key is configured, which disables the check.
    pub fn from_config(config: &SecurityConfig) -> Option<Self> {
        config.api_key().map(|key| Self {
            key: Arc::from(key),
            required: config.api_key_required,
        })
    }

    /// A wrong key is always refused. An absent key only when required.
    pub fn check(&self, presented: Option<&str>) -> KeyCheck {
        match presented {
            Some(key) if key == &*self.key => KeyCheck::Allowed,
            Some(_) => KeyCheck::Invalid,
            None if self.required => KeyCheck::Missing,
            None => KeyCheck::Allowed,
        }
    }
}

impl std::fmt::Debug for ApiKeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyPolicy")
            .field("key", &"<redacted>")
            .field("required", &self.required)
            .finish()
    }
}

/// The key from the header, else from the query string. Blank counts as absent.
pub fn presented_key(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    from_header
        .or_else(|| {
            query.and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(name, _)| name == API_KEY_QUERY)
                    .map(|(_, value)| value.into_owned())
            })
        })
        .filter(|k| !k.is_empty())
}
