//! Domain operations against the wager module.
//!
//! Winner selection, prize and fee arithmetic all happen in
//! `external_pay_winner` on-chain; this side only forwards scores and
//! reports the digest.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::blockchain::client::SuiClient;
use crate::blockchain::coins::CoinSelector;
use crate::blockchain::executor::TxExecutor;
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::{CallArg, CallDescriptor, ChainConfig, ChainError, ChainResult, TransactionResult};
use crate::blockchain::wallet::Signer;
use crate::observability::metrics;

pub const STAKE_FUNCTION: &str = "external_stake";
pub const PAY_WINNER_FUNCTION: &str = "external_pay_winner";
pub const STAKED_EVENT: &str = "ExternalGameStaked";
pub const COMPLETED_EVENT: &str = "ExternalGameCompleted";

/// Scores and stake forwarded to `external_pay_winner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutCall {
    pub requester_address: String,
    pub accepter_address: String,
    pub requester_score: u64,
    pub accepter_score: u64,
    pub stake_amount: u64,
}

/// Stake and payout orchestration over one signer and one pool.
#[derive(Debug, Clone)]
pub struct WagerOperations {
    client: SuiClient,
    selector: CoinSelector,
    executor: TxExecutor,
    signer_address: String,
    package_id: String,
    module: String,
    pool_id: String,
    coin_type: String,
    auto_stake_gas_budget: u64,
}

impl WagerOperations {
    pub fn new(client: SuiClient, signer: Arc<Signer>, config: &ChainConfig) -> Self {
        let signer_address = signer.address().to_string();
        let selector = CoinSelector::new(
            client.clone(),
            signer_address.clone(),
            config.coin_type.clone(),
            config.coin_page_size,
        );
        let builder = TxBuilder::new(client.clone(), config.gas_budget);
        let executor = TxExecutor::new(client.clone(), builder, signer);

        Self {
            client,
            selector,
            executor,
            signer_address,
            package_id: config.package_id.clone(),
            module: config.module_name.clone(),
            pool_id: config.pool_id.clone(),
            coin_type: config.coin_type.clone(),
            auto_stake_gas_budget: config.auto_stake_gas_budget,
        }
    }

    pub fn signer_address(&self) -> &str {
        &self.signer_address
    }

    /// Stake `amount` from each of two caller-supplied coins into the pool.
    pub async fn stake(
        &self,
        requester_coin_id: &str,
        accepter_coin_id: &str,
        amount: u64,
    ) -> ChainResult<TransactionResult> {
        validate_stake(requester_coin_id, accepter_coin_id, amount)?;

        let started = Instant::now();
        let excluding: HashSet<String> =
            [requester_coin_id.to_string(), accepter_coin_id.to_string()].into();

        let outcome = async {
            let gas = self.selector.select_gas_coin(&excluding).await?;
            let descriptor = self.stake_descriptor(requester_coin_id, accepter_coin_id, amount, &gas, None);
            self.executor.execute(&descriptor, STAKED_EVENT).await
        }
        .await;

        metrics::record_chain_operation("stake", &outcome, started);
        outcome
    }

    /// Stake `amount` twice from coins owned by the signer itself.
    ///
    /// Picks two coins that each cover `amount`, then a third for gas.
    pub async fn stake_with_selected_coins(&self, amount: u64) -> ChainResult<TransactionResult> {
        if amount == 0 {
            return Err(ChainError::InvalidRequest("stake amount must be greater than 0".into()));
        }

        let started = Instant::now();
        let outcome = async {
            let coins = self.selector.select_payment_coins(amount, 2).await?;
            let excluding: HashSet<String> = coins.iter().cloned().collect();
            let gas = self.selector.select_gas_coin(&excluding).await?;
            let descriptor = self.stake_descriptor(
                &coins[0],
                &coins[1],
                amount,
                &gas,
                Some(self.auto_stake_gas_budget),
            );
            self.executor.execute(&descriptor, STAKED_EVENT).await
        }
        .await;

        metrics::record_chain_operation("stake_selected", &outcome, started);
        outcome
    }

    /// Ask the pool to settle a finished match.
    pub async fn pay_winner(&self, call: &PayoutCall) -> ChainResult<TransactionResult> {
        validate_payout(call)?;

        let started = Instant::now();
        let outcome = async {
            // Pool funds move here, not caller coins, so nothing is excluded.
            let gas = self.selector.select_gas_coin(&HashSet::new()).await?;
            let descriptor = self.pay_winner_descriptor(call, &gas);
            self.executor.execute(&descriptor, COMPLETED_EVENT).await
        }
        .await;

        metrics::record_chain_operation("pay_winner", &outcome, started);
        outcome
    }

    pub fn stake_descriptor(
        &self,
        requester_coin_id: &str,
        accepter_coin_id: &str,
        amount: u64,
        gas_object_id: &str,
        gas_budget: Option<u64>,
    ) -> CallDescriptor {
        CallDescriptor {
            signer: self.signer_address.clone(),
            package_id: self.package_id.clone(),
            module: self.module.clone(),
            function: STAKE_FUNCTION.to_string(),
            type_arguments: vec![self.coin_type.clone()],
            arguments: vec![
                CallArg::ObjectId(self.pool_id.clone()),
                CallArg::ObjectId(requester_coin_id.to_string()),
                CallArg::ObjectId(accepter_coin_id.to_string()),
                CallArg::U64(amount),
            ],
            gas_object_id: gas_object_id.to_string(),
            gas_budget,
        }
    }

    pub fn pay_winner_descriptor(&self, call: &PayoutCall, gas_object_id: &str) -> CallDescriptor {
        CallDescriptor {
            signer: self.signer_address.clone(),
            package_id: self.package_id.clone(),
            module: self.module.clone(),
            function: PAY_WINNER_FUNCTION.to_string(),
            type_arguments: Vec::new(),
            arguments: vec![
                CallArg::ObjectId(self.pool_id.clone()),
                CallArg::Address(call.requester_address.clone()),
                CallArg::Address(call.accepter_address.clone()),
                CallArg::U64(call.requester_score),
                CallArg::U64(call.accepter_score),
                CallArg::U64(call.stake_amount),
            ],
            gas_object_id: gas_object_id.to_string(),
            gas_budget: None,
        }
    }

    /// Check contract identifiers are set and the pool object exists.
    pub async fn validate_pool_config(&self) -> ChainResult<()> {
        for (name, value) in [
            ("pool ID", &self.pool_id),
            ("package ID", &self.package_id),
            ("module name", &self.module),
        ] {
            if value.is_empty() {
                return Err(ChainError::InvalidParameters(format!("{} not configured", name)));
            }
        }

        let pool = self.client.get_object(&self.pool_id).await?;
        tracing::info!(
            pool_id = %pool.object_id,
            pool_type = %pool.object_type.as_deref().unwrap_or("unknown"),
            "Stake pool found"
        );
        Ok(())
    }

    pub async fn is_healthy(&self) -> bool {
        self.client.is_healthy().await
    }
}

fn validate_stake(requester_coin_id: &str, accepter_coin_id: &str, amount: u64) -> ChainResult<()> {
    if requester_coin_id.is_empty() || accepter_coin_id.is_empty() {
        return Err(ChainError::InvalidRequest("both coin IDs are required".into()));
    }
    if requester_coin_id == accepter_coin_id {
        return Err(ChainError::InvalidRequest(
            "requester and accepter coins must be different objects".into(),
        ));
    }
    if amount == 0 {
        return Err(ChainError::InvalidRequest("stake amount must be greater than 0".into()));
    }
    Ok(())
}

fn validate_payout(call: &PayoutCall) -> ChainResult<()> {
    if call.requester_address.is_empty() || call.accepter_address.is_empty() {
        return Err(ChainError::InvalidRequest(
            "requester and accepter addresses are required".into(),
        ));
    }
    if call.stake_amount == 0 {
        return Err(ChainError::InvalidRequest("stake amount must be greater than 0".into()));
    }
    Ok(())
}
