//! Mirror record storage.
//!
//! Records are written only after the chain accepted the matching
//! transaction. The relay itself only appends; status updates exist for
//! maintenance jobs. Records are never consulted to decide anything
//! on-chain.

pub mod memory;
pub mod records;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use records::{PayoutRecord, StakeRecord, StoreStats};

pub const STAKES_COLLECTION: &str = "stakes";
pub const PAYOUTS_COLLECTION: &str = "pay_winners";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store for stake and payout mirrors.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn insert_stake(&self, record: StakeRecord) -> StoreResult<()>;

    async fn insert_payout(&self, record: PayoutRecord) -> StoreResult<()>;

    /// Up to `limit` stakes where `address` is either participant, newest first.
    async fn recent_stakes(&self, address: &str, limit: usize) -> StoreResult<Vec<StakeRecord>>;

    /// Up to `limit` payouts where `address` is either participant, newest first.
    async fn recent_payouts(&self, address: &str, limit: usize) -> StoreResult<Vec<PayoutRecord>>;

    /// Set `status` on every stake with this digest; returns how many matched.
    async fn update_stake_status(&self, transaction_digest: &str, status: &str) -> StoreResult<usize>;

    /// Set `status` on every payout with this digest; returns how many matched.
    async fn update_payout_status(&self, transaction_digest: &str, status: &str) -> StoreResult<usize>;

    async fn stats(&self) -> StoreResult<StoreStats>;
}
