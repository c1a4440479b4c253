//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! FAUCET_PRIVATE_KEYS
//!     → wallet.rs (key loading, nonce reservation)
//!     → fees.rs (market probe, per-transfer quote)
//!     → transaction.rs (build, sign, broadcast)
//!     → rpc.rs / client.rs (JSON-RPC with timeouts and failover)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod fees;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use rpc::LedgerRpc;
pub use transaction::{Transfer, TxBuilder};
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId, FeeMarket, FeeQuote};
pub use wallet::{NonceRefreshPolicy, SigningIdentity};
