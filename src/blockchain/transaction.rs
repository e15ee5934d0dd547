//! Transaction building.
//!
//! # Responsibilities
//! - Reject incomplete call descriptors before they reach the node
//! - Apply the baseline gas budget when the caller leaves it open
//! - Decode the node's base64 transaction bytes

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::blockchain::client::SuiClient;
use crate::blockchain::types::{CallDescriptor, ChainError, ChainResult, UnsignedTransaction};

/// Gas budget applied when a descriptor does not set one (0.01 SUI).
pub const DEFAULT_GAS_BUDGET: u64 = 10_000_000;

/// Turns call descriptors into unsigned transaction bytes.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: SuiClient,
    default_gas_budget: u64,
}

impl TxBuilder {
    pub fn new(client: SuiClient, default_gas_budget: u64) -> Self {
        Self {
            client,
            default_gas_budget,
        }
    }

    /// Build unsigned bytes for `descriptor`.
    pub async fn build(&self, descriptor: &CallDescriptor) -> ChainResult<UnsignedTransaction> {
        validate_descriptor(descriptor)?;

        let gas_budget = descriptor.gas_budget.unwrap_or(self.default_gas_budget);
        let tx_bytes = self.client.move_call(descriptor, gas_budget).await?;

        let decoded = STANDARD
            .decode(tx_bytes.as_bytes())
            .map_err(|e| ChainError::Decode(format!("failed to decode transaction bytes: {}", e)))?;

        tracing::debug!(
            function = %descriptor.function,
            gas = %descriptor.gas_object_id,
            gas_budget = gas_budget,
            len = decoded.len(),
            "Transaction built"
        );

        Ok(UnsignedTransaction(decoded))
    }
}

fn validate_descriptor(descriptor: &CallDescriptor) -> ChainResult<()> {
    let missing: Vec<&str> = [
        ("signer", descriptor.signer.as_str()),
        ("package_id", descriptor.package_id.as_str()),
        ("module", descriptor.module.as_str()),
        ("function", descriptor.function.as_str()),
    ]
    .into_iter()
    .filter(|(_, v)| v.is_empty())
    .map(|(k, _)| k)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChainError::InvalidParameters(format!(
            "missing {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::CallArg;

    fn descriptor() -> CallDescriptor {
        CallDescriptor {
            signer: "0xsigner".into(),
            package_id: "0xpkg".into(),
            module: "wager_pool".into(),
            function: "external_stake".into(),
            type_arguments: vec!["0x2::sui::SUI".into()],
            arguments: vec![CallArg::ObjectId("0xpool".into())],
            gas_object_id: "0xgas".into(),
            gas_budget: None,
        }
    }

    #[test]
    fn test_complete_descriptor_passes() {
        assert!(validate_descriptor(&descriptor()).is_ok());
    }

    #[test]
    fn test_empty_descriptor_rejected() {
        let mut d = descriptor();
        d.function.clear();
        d.package_id.clear();
        let err = validate_descriptor(&d).unwrap_err();
        assert_eq!(
            err,
            ChainError::InvalidParameters("missing package_id, function".into())
        );
    }
}
