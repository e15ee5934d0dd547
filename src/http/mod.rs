//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, request ID)
//!     → middleware.rs (rate limit, API key)
//!     → handlers.rs (extract, validate input)
//!     → GameService
//!     → response.rs (status mapping, JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, HttpServer, X_REQUEST_ID};
