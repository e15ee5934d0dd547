//! Game flows exposed over HTTP.

pub mod gateway;
pub mod service;
pub mod types;

pub use gateway::ChainGateway;
pub use service::{GameService, ServiceError, ServiceResult};
pub use types::{PayWinnerRequest, StakeRequest};
