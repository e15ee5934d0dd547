//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) in production, human-readable otherwise
//! - Request ID flows through every HTTP log line
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
