//! Sui integration subsystem.
//!
//! # Data Flow
//! ```text
//! WAGER_SIGNER_SEED
//!     → wallet.rs (key loading, address derivation, signing)
//! rpc.rs (JSON-RPC 2.0 over HTTP, per-call timeout)
//!     → client.rs (typed node methods)
//!     → coins.rs (gas and payment coin selection)
//!     → transaction.rs (unsafe_moveCall → unsigned bytes)
//!     → executor.rs (sign, execute, effects and events)
//!     → operations.rs (stake, pay_winner)
//! ```
//!
//! # Security Constraints
//! - Signer seed ONLY from the environment
//! - Never log seeds or signatures
//! - Every RPC call is bounded by the configured timeout
//! - No implicit retries; a failed step surfaces to the caller

pub mod client;
pub mod coins;
pub mod executor;
pub mod operations;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::SuiClient;
pub use coins::CoinSelector;
pub use executor::TxExecutor;
pub use operations::{PayoutCall, WagerOperations};
pub use rpc::{HttpTransport, RpcTransport};
pub use transaction::TxBuilder;
pub use types::{CallArg, CallDescriptor, ChainConfig, ChainError, ChainResult, TransactionResult};
pub use wallet::{SignedEnvelope, Signer};
