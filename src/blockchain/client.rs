//! Typed Sui RPC client.
//!
//! # Responsibilities
//! - One method per consumed RPC method, each decoding into its own DTO
//! - Query chain state (coins, balances, objects, transactions, epoch)
//! - Build and submit transaction blocks
//! - Provide a health check for chain connectivity

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::rpc::RpcTransport;
use crate::blockchain::types::{
    BalanceDto, CallDescriptor, ChainError, ChainResult, Coin, CoinPage, DryRunDto, EpochDto,
    ObjectData, ObjectResponse, TransactionBlockDto, TxBytesDto,
};
use crate::blockchain::wallet::SignedEnvelope;
use crate::observability::metrics;

/// Sui RPC client over a shared transport.
#[derive(Clone)]
pub struct SuiClient {
    transport: Arc<dyn RpcTransport>,
}

impl SuiClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> ChainResult<T> {
        let raw = self.transport.call(method, params).await?;
        serde_json::from_value(raw)
            .map_err(|e| ChainError::Decode(format!("failed to parse {} response: {}", method, e)))
    }

    /// Fetch one page of coins of `coin_type` owned by `owner`.
    pub async fn get_coins_page(
        &self,
        owner: &str,
        coin_type: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> ChainResult<(Vec<Coin>, Option<String>)> {
        let page: CoinPage = self
            .request(
                "suix_getCoins",
                vec![json!(owner), json!(coin_type), json!(cursor), json!(limit)],
            )
            .await?;

        let coins = page
            .data
            .into_iter()
            .map(Coin::try_from)
            .collect::<ChainResult<Vec<_>>>()?;
        let next = if page.has_next_page { page.next_cursor } else { None };
        Ok((coins, next))
    }

    /// Fetch every coin of `coin_type`, following cursors until exhausted.
    pub async fn get_all_coins(&self, owner: &str, coin_type: &str, page_size: usize) -> ChainResult<Vec<Coin>> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let (coins, next) = self
                .get_coins_page(owner, coin_type, cursor.as_deref(), page_size)
                .await?;
            all.extend(coins);

            match next {
                // A node that hands back the same cursor would loop forever.
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(all)
    }

    /// Total balance of `coin_type` as reported by the node.
    pub async fn get_balance(&self, owner: &str, coin_type: &str) -> ChainResult<u64> {
        let dto: BalanceDto = self
            .request("suix_getBalance", vec![json!(owner), json!(coin_type)])
            .await?;
        dto.total_balance
            .parse()
            .map_err(|e| ChainError::Decode(format!("invalid totalBalance '{}': {}", dto.total_balance, e)))
    }

    /// Sum of individual coin balances, computed from the coin listing.
    pub async fn get_total_balance(&self, owner: &str, coin_type: &str, page_size: usize) -> ChainResult<u64> {
        let coins = self.get_all_coins(owner, coin_type, page_size).await?;
        Ok(coins.iter().fold(0u64, |acc, c| acc.saturating_add(c.balance)))
    }

    /// Look up an object with its type and content.
    pub async fn get_object(&self, object_id: &str) -> ChainResult<ObjectData> {
        let resp: ObjectResponse = self
            .request(
                "sui_getObject",
                vec![json!(object_id), json!({ "showContent": true, "showType": true })],
            )
            .await?;

        match resp.data {
            Some(data) if !data.object_id.is_empty() => Ok(data),
            _ => Err(ChainError::NotFound(format!(
                "object {} ({})",
                object_id,
                resp.error.map(|e| e.to_string()).unwrap_or_else(|| "no data".into())
            ))),
        }
    }

    /// Ask the node to build an unsigned Move-call transaction.
    ///
    /// Returns the base64 `txBytes` exactly as the node produced them.
    pub async fn move_call(&self, descriptor: &CallDescriptor, gas_budget: u64) -> ChainResult<String> {
        let params = vec![
            json!(descriptor.signer),
            json!(descriptor.package_id),
            json!(descriptor.module),
            json!(descriptor.function),
            json!(descriptor.type_arguments),
            serde_json::to_value(&descriptor.arguments)
                .map_err(|e| ChainError::InvalidParameters(format!("unserializable arguments: {}", e)))?,
            json!(descriptor.gas_object_id),
            json!(gas_budget.to_string()),
        ];
        let dto: TxBytesDto = self.request("unsafe_moveCall", params).await?;
        Ok(dto.tx_bytes)
    }

    /// Estimate net gas for unsigned transaction bytes.
    pub async fn dry_run(&self, tx_bytes: &[u8]) -> ChainResult<u64> {
        let dto: DryRunDto = self
            .request("sui_dryRunTransactionBlock", vec![json!(STANDARD.encode(tx_bytes))])
            .await?;
        dto.effects
            .gas_used
            .ok_or_else(|| ChainError::Decode("dry run returned no gasUsed".into()))?
            .net()
    }

    /// Submit signed transaction bytes, requesting effects and events.
    pub async fn execute_transaction_block(
        &self,
        tx_bytes: &[u8],
        signature: &SignedEnvelope,
    ) -> ChainResult<TransactionBlockDto> {
        self.request(
            "sui_executeTransactionBlock",
            vec![
                json!(STANDARD.encode(tx_bytes)),
                json!([signature.to_base64()]),
                json!({ "showEffects": true, "showEvents": true }),
            ],
        )
        .await
    }

    /// Look up a transaction by digest.
    pub async fn get_transaction_block(&self, digest: &str) -> ChainResult<TransactionBlockDto> {
        if digest.is_empty() {
            return Err(ChainError::InvalidRequest("transaction digest is required".into()));
        }
        self.request(
            "sui_getTransactionBlock",
            vec![
                json!(digest),
                json!({
                    "showInput": true,
                    "showRawInput": false,
                    "showEffects": true,
                    "showEvents": true,
                    "showObjectChanges": true,
                }),
            ],
        )
        .await
    }

    /// Poll until the node knows about `digest` or `max_wait` elapses.
    pub async fn wait_for_transaction(
        &self,
        digest: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> ChainResult<TransactionBlockDto> {
        if digest.is_empty() {
            return Err(ChainError::InvalidRequest("transaction digest is required".into()));
        }

        let result = timeout(max_wait, async {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                match self.get_transaction_block(digest).await {
                    Ok(tx) => return tx,
                    Err(e) => tracing::debug!(digest = %digest, error = %e, "Transaction not visible yet"),
                }
            }
        })
        .await;

        result.map_err(|_| ChainError::Timeout(max_wait.as_secs()))
    }

    /// Current epoch number.
    pub async fn current_epoch(&self) -> ChainResult<u64> {
        let dto: EpochDto = self.request("suix_getCurrentEpoch", vec![]).await?;
        dto.epoch
            .parse()
            .map_err(|e| ChainError::Decode(format!("invalid epoch '{}': {}", dto.epoch, e)))
    }

    /// Check if the node is reachable and answering.
    pub async fn is_healthy(&self) -> bool {
        let healthy = match self.current_epoch().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Chain health check failed");
                false
            }
        };
        metrics::record_chain_health(healthy);
        healthy
    }
}

impl std::fmt::Debug for SuiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiClient").finish_non_exhaustive()
    }
}
