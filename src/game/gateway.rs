//! Chain capability consumed by the game service.

use async_trait::async_trait;

use crate::blockchain::operations::{PayoutCall, WagerOperations};
use crate::blockchain::types::ChainResult;

/// Submits wager transactions and reports their digests.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn stake(&self, requester_coin_id: &str, accepter_coin_id: &str, amount: u64) -> ChainResult<String>;

    async fn pay_winner(&self, call: &PayoutCall) -> ChainResult<String>;

    async fn is_healthy(&self) -> bool;

    /// Address paying gas for every submission.
    fn signer_address(&self) -> &str;
}

#[async_trait]
impl ChainGateway for WagerOperations {
    async fn stake(&self, requester_coin_id: &str, accepter_coin_id: &str, amount: u64) -> ChainResult<String> {
        let result = WagerOperations::stake(self, requester_coin_id, accepter_coin_id, amount).await?;
        Ok(result.digest)
    }

    async fn pay_winner(&self, call: &PayoutCall) -> ChainResult<String> {
        let result = WagerOperations::pay_winner(self, call).await?;
        Ok(result.digest)
    }

    async fn is_healthy(&self) -> bool {
        WagerOperations::is_healthy(self).await
    }

    fn signer_address(&self) -> &str {
        WagerOperations::signer_address(self)
    }
}
