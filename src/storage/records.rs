use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const STATUS_COMPLETED: &str = "completed";

/// Mirror of a successful `external_stake`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub id: String,
    pub requester_coin_id: String,
    pub accepter_coin_id: String,
    pub requester_address: String,
    pub accepter_address: String,
    pub stake_amount: u64,
    pub status: String,
    /// Seconds since epoch.
    pub timestamp: i64,
    pub transaction_digest: String,
}

/// Mirror of a successful `external_pay_winner`.
///
/// The winner and prize are decided on-chain and only appear in the
/// emitted event, so they are not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub id: String,
    pub requester_address: String,
    pub accepter_address: String,
    pub requester_score: u64,
    pub accepter_score: u64,
    pub stake_amount: u64,
    pub status: String,
    pub timestamp: i64,
    pub transaction_digest: String,
}

/// Collection totals across both record kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub stakes: usize,
    pub payouts: usize,
    /// Distinct addresses appearing as either participant.
    pub players: usize,
}

/// Participant lookup shared by both record kinds.
pub trait Participants {
    fn requester(&self) -> &str;
    fn accepter(&self) -> &str;
    fn timestamp(&self) -> i64;

    fn involves(&self, address: &str) -> bool {
        self.requester() == address || self.accepter() == address
    }
}

impl Participants for StakeRecord {
    fn requester(&self) -> &str {
        &self.requester_address
    }
    fn accepter(&self) -> &str {
        &self.accepter_address
    }
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Participants for PayoutRecord {
    fn requester(&self) -> &str {
        &self.requester_address
    }
    fn accepter(&self) -> &str {
        &self.accepter_address
    }
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Digest lookup and status update shared by both record kinds.
pub trait Mirrored {
    fn transaction_digest(&self) -> &str;
    fn set_status(&mut self, status: &str);
}

impl Mirrored for StakeRecord {
    fn transaction_digest(&self) -> &str {
        &self.transaction_digest
    }
    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

impl Mirrored for PayoutRecord {
    fn transaction_digest(&self) -> &str {
        &self.transaction_digest
    }
    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
