//! Request admission: shared API key and per-client rate limiting.
//!
//! Both components are built from `SecurityConfig` when the HTTP server
//! starts and live exactly as long as it does.

pub mod access_control;
pub mod rate_limit;

pub use access_control::{ApiKeyPolicy, KeyCheck};
pub use rate_limit::RateLimiter;
