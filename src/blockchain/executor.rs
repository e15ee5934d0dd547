//! Sign, submit and interpret transactions.
//!
//! # Flow
//! ```text
//! CallDescriptor
//!     → TxBuilder::build      (Built)
//!     → Signer::sign          (Signed)
//!     → executeTransactionBlock (Submitted)
//!     → effects status        (Succeeded | Failed)
//! ```
//!
//! A failure is terminal for those bytes. Resubmitting means rebuilding,
//! because the gas and coin references are likely stale by then.

use std::sync::Arc;

use crate::blockchain::client::SuiClient;
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::{
    CallDescriptor, ChainError, ChainResult, EffectsStatus, TransactionResult,
};
use crate::blockchain::wallet::Signer;

/// Executes call descriptors end to end.
#[derive(Debug, Clone)]
pub struct TxExecutor {
    client: SuiClient,
    builder: TxBuilder,
    signer: Arc<Signer>,
}

impl TxExecutor {
    pub fn new(client: SuiClient, builder: TxBuilder, signer: Arc<Signer>) -> Self {
        Self {
            client,
            builder,
            signer,
        }
    }

    /// Execute `descriptor` and look for `expected_event` among the emitted events.
    ///
    /// A missing event only logs a warning; success is decided by the
    /// effects status alone.
    pub async fn execute(
        &self,
        descriptor: &CallDescriptor,
        expected_event: &str,
    ) -> ChainResult<TransactionResult> {
        let unsigned = self.builder.build(descriptor).await?;

        let envelope = self.signer.sign(unsigned.as_bytes());
        tracing::debug!(function = %descriptor.function, "Transaction signed");

        let dto = self
            .client
            .execute_transaction_block(unsigned.as_bytes(), &envelope)
            .await?;
        let result = TransactionResult::from(dto);

        tracing::debug!(digest = %result.digest, "Transaction submitted");

        match &result.effects_status {
            EffectsStatus::Failure { status, error } => {
                tracing::warn!(
                    digest = %result.digest,
                    function = %descriptor.function,
                    status = %status,
                    error = %error,
                    "Transaction failed on-chain"
                );
                return Err(ChainError::TransactionFailed {
                    status: status.clone(),
                    error: error.clone(),
                });
            }
            EffectsStatus::Unknown => {
                tracing::debug!(digest = %result.digest, "Node omitted effects status");
            }
            EffectsStatus::Success => {}
        }

        match result.find_event(&descriptor.package_id, &descriptor.module, expected_event) {
            Some(event) => tracing::info!(
                digest = %result.digest,
                event = %event.event_type,
                payload = %event.payload,
                "Event emitted"
            ),
            None => tracing::warn!(
                digest = %result.digest,
                expected = %format!("{}::{}::{}", descriptor.package_id, descriptor.module, expected_event),
                "Expected event not found in transaction events"
            ),
        }

        Ok(result)
    }
}
