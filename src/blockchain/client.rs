//! Blockchain RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint and its failovers
//! - Answer the [`LedgerRpc`] queries the dispatch path needs
//! - Bound every call with the configured RPC timeout

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::rpc::LedgerRpc;
use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId};

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Primary endpoint, kept for diagnostics.
    rpc_url: String,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a client for the configured endpoint and its failovers.
    ///
    /// No request is made here; an unreachable node surfaces on first use.
    pub fn new(config: &BlockchainConfig) -> BlockchainResult<Self> {
        Self::connect(&config.rpc_url, &config.failover_urls, config.rpc_timeout_secs)
    }

    /// Create a client for an arbitrary endpoint list.
    pub fn connect(rpc_url: &str, failover_urls: &[String], timeout_secs: u64) -> BlockchainResult<Self> {
        let mut providers = Vec::new();

        let primary_url: url::Url = rpc_url
            .parse()
            .map_err(|e| BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        tracing::debug!(rpc_url = %rpc_url, providers = providers.len(), "Blockchain client created");

        Ok(Self {
            providers,
            rpc_url: rpc_url.to_string(),
            timeout_duration: Duration::from_secs(timeout_secs),
        })
    }

    /// Resolve the chain to sign for.
    ///
    /// A configured ID wins but is checked against the node when reachable;
    /// otherwise a known network name is used, and finally the node is asked.
    pub async fn resolve_chain_id(&self, configured: Option<u64>, network: &str) -> BlockchainResult<ChainId> {
        if let Some(expected) = configured {
            match self.chain_id().await {
                Ok(actual) if actual.0 != expected => {
                    return Err(BlockchainError::ChainMismatch { expected, actual: actual.0 });
                }
                Ok(_) => {}
                Err(e) => {
                    // Don't fail startup - allow graceful degradation
                    tracing::warn!(error = %e, "Chain ID verification failed, using configured value");
                }
            }
            return Ok(ChainId(expected));
        }
        if let Some(known) = ChainId::from_network_name(network) {
            return Ok(known);
        }
        self.chain_id().await
    }

    /// Run `call` against each provider in order until one answers.
    async fn with_failover<T, F, Fut>(&self, op: &'static str, call: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, op, error = %e, "RPC error, trying next provider"),
                Err(_) => tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider"),
            }
        }
        Err(BlockchainError::Rpc(format!("All RPC providers failed: {}", op)))
    }

    /// Get the configured primary endpoint.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl LedgerRpc for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("eth_getTransactionCount", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn latest_base_fee(&self) -> BlockchainResult<Option<u128>> {
        let block = self
            .with_failover("eth_getBlockByNumber", |p| async move {
                p.get_block_by_number(BlockNumberOrTag::Latest).await
            })
            .await?
            .ok_or_else(|| BlockchainError::Rpc("latest block not found".to_string()))?;
        Ok(block.header.base_fee_per_gas.map(u128::from))
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("eth_gasPrice", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn max_priority_fee(&self) -> BlockchainResult<u128> {
        self.with_failover("eth_maxPriorityFeePerGas", |p| async move {
            p.get_max_priority_fee_per_gas().await
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.send_raw_transaction(raw)).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                // The node judged the transaction itself; another node would agree.
                Ok(Err(e)) if e.is_error_resp() => return Err(BlockchainError::Submission(e.to_string())),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout, trying next provider"),
            }
        }
        Err(BlockchainError::Rpc("All RPC providers failed: eth_sendRawTransaction".to_string()))
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.with_failover("eth_getBalance", |p| async move { p.get_balance(address).await })
            .await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
