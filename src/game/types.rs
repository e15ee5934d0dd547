use serde::{Deserialize, Serialize};

use crate::storage::{PayoutRecord, StakeRecord};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StakeRequest {
    pub requester_coin_id: String,
    pub accepter_coin_id: String,
    pub requester_address: String,
    pub accepter_address: String,
    pub stake_amount: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PayWinnerRequest {
    pub requester_address: String,
    pub accepter_address: String,
    #[serde(default)]
    pub requester_score: u64,
    #[serde(default)]
    pub accepter_score: u64,
    pub stake_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StakeResponse {
    pub success: bool,
    pub transaction_digest: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayWinnerResponse {
    pub success: bool,
    pub transaction_digest: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeHistoryResponse {
    pub success: bool,
    pub stakes: Vec<StakeRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameHistoryResponse {
    pub success: bool,
    pub games: Vec<PayoutRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStats {
    pub total_games: usize,
    pub total_stakes: usize,
    pub active_players: usize,
    /// Seconds since epoch when the totals were read.
    pub last_updated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatsResponse {
    pub success: bool,
    pub data: GameStats,
}
