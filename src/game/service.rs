//! Game service: submit to chain, then mirror locally.
//!
//! # Flow
//! ```text
//! request → validate → ChainGateway (digest) → GameStore insert → response
//! ```
//!
//! Once the chain accepted a transaction the caller always hears about
//! it. A failed mirror write is logged and counted, never returned.

use std::sync::Arc;

use thiserror::Error;

use crate::blockchain::operations::PayoutCall;
use crate::blockchain::types::ChainError;
use crate::game::gateway::ChainGateway;
use crate::game::types::{
    GameHistoryResponse, GameStats, GameStatsResponse, PayWinnerRequest, PayWinnerResponse, StakeHistoryResponse, StakeRequest,
    StakeResponse,
};
use crate::observability::metrics;
use crate::storage::records::{new_record_id, unix_now, STATUS_COMPLETED};
use crate::storage::{GameStore, PayoutRecord, StakeRecord, StoreError, PAYOUTS_COLLECTION, STAKES_COLLECTION};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

const STAKE_MESSAGE: &str = "Stake successful. Fees are deducted by the pool contract.";
const PAYOUT_MESSAGE: &str = "Winner payment processed by the pool contract.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Blockchain transaction failed: {0}")]
    Chain(#[from] ChainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct GameService {
    chain: Arc<dyn ChainGateway>,
    store: Arc<dyn GameStore>,
    history_limit: usize,
}

impl GameService {
    pub fn new(chain: Arc<dyn ChainGateway>, store: Arc<dyn GameStore>, history_limit: usize) -> Self {
        Self {
            chain,
            store,
            history_limit: history_limit.max(1),
        }
    }

    pub fn chain(&self) -> &Arc<dyn ChainGateway> {
        &self.chain
    }

    pub async fn stake_game(&self, req: &StakeRequest) -> ServiceResult<StakeResponse> {
        if req.requester_coin_id.is_empty() || req.accepter_coin_id.is_empty() || req.stake_amount == 0 {
            return Err(ServiceError::InvalidRequest(
                "missing coin IDs or zero stake amount".into(),
            ));
        }
        if req.requester_address.is_empty() || req.accepter_address.is_empty() {
            return Err(ServiceError::InvalidRequest("addresses are required".into()));
        }

        tracing::info!(
            requester = %req.requester_address,
            accepter = %req.accepter_address,
            amount = req.stake_amount,
            "Processing stake"
        );

        let digest = self
            .chain
            .stake(&req.requester_coin_id, &req.accepter_coin_id, req.stake_amount)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Blockchain stake failed");
                e
            })?;

        let record = StakeRecord {
            id: new_record_id(),
            requester_coin_id: req.requester_coin_id.clone(),
            accepter_coin_id: req.accepter_coin_id.clone(),
            requester_address: req.requester_address.clone(),
            accepter_address: req.accepter_address.clone(),
            stake_amount: req.stake_amount,
            status: STATUS_COMPLETED.to_string(),
            timestamp: unix_now(),
            transaction_digest: digest.clone(),
        };
        if let Err(e) = self.store.insert_stake(record).await {
            tracing::warn!(
                digest = %digest,
                error = %e,
                "Stake record not saved (transaction still succeeded)"
            );
            metrics::record_persistence_warning(STAKES_COLLECTION);
        }

        tracing::info!(digest = %digest, "Stake transaction successful");
        Ok(StakeResponse {
            success: true,
            transaction_digest: digest,
            message: STAKE_MESSAGE.to_string(),
        })
    }

    pub async fn pay_winner(&self, req: &PayWinnerRequest) -> ServiceResult<PayWinnerResponse> {
        if req.requester_address.is_empty() || req.accepter_address.is_empty() || req.stake_amount == 0 {
            return Err(ServiceError::InvalidRequest(
                "missing addresses or zero stake amount".into(),
            ));
        }

        tracing::info!(
            requester_score = req.requester_score,
            accepter_score = req.accepter_score,
            stake = req.stake_amount,
            "Processing winner payment"
        );

        let call = PayoutCall {
            requester_address: req.requester_address.clone(),
            accepter_address: req.accepter_address.clone(),
            requester_score: req.requester_score,
            accepter_score: req.accepter_score,
            stake_amount: req.stake_amount,
        };
        let digest = self.chain.pay_winner(&call).await.map_err(|e| {
            tracing::error!(error = %e, "Blockchain pay winner failed");
            e
        })?;

        let record = PayoutRecord {
            id: new_record_id(),
            requester_address: call.requester_address,
            accepter_address: call.accepter_address,
            requester_score: call.requester_score,
            accepter_score: call.accepter_score,
            stake_amount: call.stake_amount,
            status: STATUS_COMPLETED.to_string(),
            timestamp: unix_now(),
            transaction_digest: digest.clone(),
        };
        if let Err(e) = self.store.insert_payout(record).await {
            tracing::warn!(
                digest = %digest,
                error = %e,
                "Payout record not saved (transaction still succeeded)"
            );
            metrics::record_persistence_warning(PAYOUTS_COLLECTION);
        }

        tracing::info!(digest = %digest, "Pay winner transaction successful");
        Ok(PayWinnerResponse {
            success: true,
            transaction_digest: digest,
            message: PAYOUT_MESSAGE.to_string(),
        })
    }

    pub async fn stake_history(&self, address: &str) -> ServiceResult<StakeHistoryResponse> {
        if address.is_empty() {
            return Err(ServiceError::InvalidRequest("address is required".into()));
        }

        let stakes = self.store.recent_stakes(address, self.history_limit).await?;
        tracing::debug!(address = %address, count = stakes.len(), "Retrieved stake history");
        Ok(StakeHistoryResponse {
            success: true,
            count: stakes.len(),
            stakes,
        })
    }

    pub async fn game_history(&self, address: &str) -> ServiceResult<GameHistoryResponse> {
        if address.is_empty() {
            return Err(ServiceError::InvalidRequest("address is required".into()));
        }

        let games = self.store.recent_payouts(address, self.history_limit).await?;
        tracing::debug!(address = %address, count = games.len(), "Retrieved game history");
        Ok(GameHistoryResponse {
            success: true,
            count: games.len(),
            games,
        })
    }

    /// Totals over the local mirror.
    pub async fn game_stats(&self) -> ServiceResult<GameStatsResponse> {
        let stats = self.store.stats().await?;
        Ok(GameStatsResponse {
            success: true,
            data: GameStats {
                total_games: stats.payouts,
                total_stakes: stats.stakes,
                active_players: stats.players,
                last_updated: unix_now(),
            },
        })
    }
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("signer", &self.chain.signer_address())
            .field("history_limit", &self.history_limit)
            .finish()
    }
}
