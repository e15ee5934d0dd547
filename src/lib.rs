//! Wager relay: stakes and settles two-player matches against a Sui pool contract.

pub mod blockchain;
pub mod config;
pub mod game;
pub mod http;
pub mod observability;
pub mod security;
pub mod storage;

pub use config::schema::AppConfig;
pub use game::GameService;
pub use http::HttpServer;
