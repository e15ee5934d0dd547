//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Signature scheme flag for Ed25519 in the Sui envelope.
pub const ED25519_FLAG: u8 = 0x00;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Local validation failed before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A call descriptor was missing required parts.
    #[error("Invalid transaction parameters: {0}")]
    InvalidParameters(String),

    /// Network failure or a body that is not a JSON-RPC envelope.
    #[error("Transport error: {0}")]
    Transport(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node answered, but the result did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The node returned a JSON-RPC error object.
    #[error("RPC error [{code}]: {message}")]
    RemoteRpc { code: i64, message: String },

    /// Not enough coins individually cover the required amount.
    #[error("Insufficient coins: need {needed} coins with {min_balance} balance each, found {found}")]
    InsufficientCoins {
        needed: usize,
        found: usize,
        min_balance: u64,
    },

    /// Every spendable coin was excluded from gas selection.
    #[error("No gas coin available")]
    NoGasCoinAvailable,

    /// The chain executed the transaction and reported a non-success status.
    #[error("Transaction failed with status {status}: {error}")]
    TransactionFailed { status: String, error: String },

    /// Malformed key material.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// A queried object or transaction does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ChainError {
    /// True for failures that were rejected before touching the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ChainError::InvalidRequest(_) | ChainError::InvalidParameters(_) | ChainError::Wallet(_)
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::InvalidRequest(_) => "invalid_request",
            ChainError::InvalidParameters(_) => "invalid_parameters",
            ChainError::Transport(_) => "transport",
            ChainError::Timeout(_) => "timeout",
            ChainError::Decode(_) => "decode",
            ChainError::RemoteRpc { .. } => "remote_rpc",
            ChainError::InsufficientCoins { .. } => "insufficient_coins",
            ChainError::NoGasCoinAvailable => "no_gas_coin",
            ChainError::TransactionFailed { .. } => "transaction_failed",
            ChainError::Wallet(_) => "wallet",
            ChainError::NotFound(_) => "not_found",
        }
    }
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// A spendable coin object, as observed at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub object_id: String,
    pub balance: u64,
    pub coin_type: String,
}

/// Positional argument of a Move call.
///
/// The node accepts every argument as a JSON string; the variant only
/// records what the string means on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// An object reference (`&mut T`, `Coin<T>`).
    ObjectId(String),
    /// A Sui address (`address`).
    Address(String),
    /// An unsigned integer (`u64`), sent as a decimal string.
    U64(u64),
    /// Any other pure value already rendered as a string.
    Pure(String),
}

impl CallArg {
    /// The wire representation of this argument.
    pub fn as_wire(&self) -> String {
        match self {
            CallArg::ObjectId(id) | CallArg::Address(id) | CallArg::Pure(id) => id.clone(),
            CallArg::U64(n) => n.to_string(),
        }
    }
}

impl Serialize for CallArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

/// Description of one Move call. Built per operation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    pub signer: String,
    pub package_id: String,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<CallArg>,
    pub gas_object_id: String,
    /// Gas budget in MIST; `None` lets the builder apply its baseline.
    pub gas_budget: Option<u64>,
}

/// Unsigned transaction bytes returned by the node for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction(pub Vec<u8>);

impl UnsignedTransaction {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Effects status reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectsStatus {
    Success,
    Failure { status: String, error: String },
    /// The node omitted effects status.
    Unknown,
}

/// A typed event emitted during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "parsedJson", default)]
    pub payload: serde_json::Value,
}

/// Outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    pub digest: String,
    pub effects_status: EffectsStatus,
    pub events: Vec<ChainEvent>,
}

impl TransactionResult {
    /// First event whose type names `package::module::name`.
    pub fn find_event(&self, package_id: &str, module: &str, name: &str) -> Option<&ChainEvent> {
        self.events
            .iter()
            .find(|e| event_type_matches(&e.event_type, package_id, module, name))
    }
}

/// Match an event type against `package::module::name`, ignoring generic
/// parameters and leading zeros in the package address.
pub fn event_type_matches(event_type: &str, package_id: &str, module: &str, name: &str) -> bool {
    let base = event_type.split('<').next().unwrap_or(event_type);
    let suffix = format!("::{}::{}", module, name);
    let Some(prefix) = base.strip_suffix(&suffix) else {
        return false;
    };
    let prefix = prefix.rsplit("::").next().unwrap_or(prefix);
    normalize_address(prefix) == normalize_address(package_id)
}

fn normalize_address(addr: &str) -> String {
    let hex = addr.strip_prefix("0x").unwrap_or(addr);
    let trimmed = hex.trim_start_matches('0');
    trimmed.to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Response DTOs, one per RPC method.
// ---------------------------------------------------------------------------

/// `suix_getCoins` page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPage {
    #[serde(default)]
    pub data: Vec<CoinDto>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDto {
    pub coin_object_id: String,
    pub balance: String,
    #[serde(default)]
    pub coin_type: String,
}

impl TryFrom<CoinDto> for Coin {
    type Error = ChainError;

    fn try_from(dto: CoinDto) -> ChainResult<Self> {
        let balance = dto.balance.parse::<u64>().map_err(|e| {
            ChainError::Decode(format!(
                "coin {} has invalid balance '{}': {}",
                dto.coin_object_id, dto.balance, e
            ))
        })?;
        Ok(Coin {
            object_id: dto.coin_object_id,
            balance,
            coin_type: dto.coin_type,
        })
    }
}

/// `suix_getBalance`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDto {
    pub total_balance: String,
}

/// `sui_getObject`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub data: Option<ObjectData>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: String,
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

/// `unsafe_moveCall`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxBytesDto {
    pub tx_bytes: String,
}

/// `sui_executeTransactionBlock` and `sui_getTransactionBlock`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBlockDto {
    pub digest: String,
    #[serde(default)]
    pub effects: Option<EffectsDto>,
    #[serde(default)]
    pub events: Vec<ChainEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectsDto {
    #[serde(default)]
    pub status: Option<StatusDto>,
    #[serde(default)]
    pub gas_used: Option<GasUsedDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusDto {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasUsedDto {
    pub computation_cost: String,
    pub storage_cost: String,
    pub storage_rebate: String,
}

impl GasUsedDto {
    /// Net gas: computation + storage - rebate, floored at zero.
    pub fn net(&self) -> ChainResult<u64> {
        let parse = |field: &str, v: &str| {
            v.parse::<u64>()
                .map_err(|e| ChainError::Decode(format!("invalid {} '{}': {}", field, v, e)))
        };
        let computation = parse("computationCost", &self.computation_cost)?;
        let storage = parse("storageCost", &self.storage_cost)?;
        let rebate = parse("storageRebate", &self.storage_rebate)?;
        Ok(computation.saturating_add(storage).saturating_sub(rebate))
    }
}

/// `sui_dryRunTransactionBlock`.
#[derive(Debug, Clone, Deserialize)]
pub struct DryRunDto {
    pub effects: EffectsDto,
}

/// `suix_getCurrentEpoch`.
#[derive(Debug, Clone, Deserialize)]
pub struct EpochDto {
    pub epoch: String,
}

impl From<TransactionBlockDto> for TransactionResult {
    fn from(dto: TransactionBlockDto) -> Self {
        let effects_status = match dto.effects.and_then(|e| e.status) {
            Some(s) if s.status == "success" => EffectsStatus::Success,
            Some(s) => EffectsStatus::Failure {
                error: s.error.unwrap_or_default(),
                status: s.status,
            },
            None => EffectsStatus::Unknown,
        };
        TransactionResult {
            digest: dto.digest,
            effects_status,
            events: dto.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_args_serialize_as_strings() {
        let args = vec![
            CallArg::ObjectId("0xpool".into()),
            CallArg::Address("0xabc".into()),
            CallArg::U64(100),
        ];
        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value, json!(["0xpool", "0xabc", "100"]));
    }

    #[test]
    fn test_event_type_matching() {
        assert!(event_type_matches(
            "0x00ab::wager_pool::ExternalGameStaked",
            "0xab",
            "wager_pool",
            "ExternalGameStaked"
        ));
        assert!(event_type_matches(
            "0xab::wager_pool::ExternalGameStaked<0x2::sui::SUI>",
            "0xab",
            "wager_pool",
            "ExternalGameStaked"
        ));
        assert!(!event_type_matches(
            "0xcd::wager_pool::ExternalGameStaked",
            "0xab",
            "wager_pool",
            "ExternalGameStaked"
        ));
        assert!(!event_type_matches(
            "0xab::wager_pool::ExternalGameCompleted",
            "0xab",
            "wager_pool",
            "ExternalGameStaked"
        ));
    }

    #[test]
    fn test_effects_status_decoding() {
        let dto: TransactionBlockDto = serde_json::from_value(json!({
            "digest": "D1",
            "effects": { "status": { "status": "failure", "error": "InsufficientGas" } }
        }))
        .unwrap();
        let result = TransactionResult::from(dto);
        assert_eq!(
            result.effects_status,
            EffectsStatus::Failure {
                status: "failure".into(),
                error: "InsufficientGas".into()
            }
        );

        let dto: TransactionBlockDto = serde_json::from_value(json!({ "digest": "D2" })).unwrap();
        assert_eq!(TransactionResult::from(dto).effects_status, EffectsStatus::Unknown);
    }

    #[test]
    fn test_gas_used_net_saturates() {
        let gas = GasUsedDto {
            computation_cost: "1000".into(),
            storage_cost: "500".into(),
            storage_rebate: "2000".into(),
        };
        assert_eq!(gas.net().unwrap(), 0);
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ChainError::InsufficientCoins {
            needed: 2,
            found: 1,
            min_balance: 100,
        };
        assert!(err.to_string().contains("found 1"));
        assert!(ChainError::InvalidRequest("x".into()).is_local());
        assert!(!ChainError::NoGasCoinAvailable.is_local());
    }
}
