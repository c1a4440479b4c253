//! The remote ledger calls the dispatch path depends on.
//!
//! Everything that suspends a transfer goes through this trait, which keeps the
//! nonce and fee logic testable against an in-memory ledger.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, ChainId};

/// JSON-RPC operations used by the faucet.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Chain ID reported by the node.
    async fn chain_id(&self) -> BlockchainResult<ChainId>;

    /// Next nonce for `address`, counting transactions still in the mempool.
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// Base fee of the latest block header, `None` if the header carries none.
    async fn latest_base_fee(&self) -> BlockchainResult<Option<u128>>;

    /// Suggested legacy gas price in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// Suggested priority tip in wei.
    async fn max_priority_fee(&self) -> BlockchainResult<u128>;

    /// Broadcast an EIP-2718 encoded signed transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    /// Balance of `address` at the latest block.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;
}
