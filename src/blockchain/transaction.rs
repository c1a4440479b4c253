//! Transaction building, signing, and submission.
//!
//! # Responsibilities
//! - Reserve a nonce from the signing identity
//! - Quote fees for the probed market
//! - Sign for the configured chain and broadcast
//! - Resync the identity after a nonce conflict

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};

use crate::blockchain::fees;
use crate::blockchain::rpc::LedgerRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, FeeMarket, FeeQuote};
use crate::blockchain::wallet::{NonceRefreshPolicy, SigningIdentity};
use crate::observability::metrics;

/// Something that can pay out native currency to an address.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Address funds are sent from. Informational when several keys rotate.
    fn sender(&self) -> Address;

    /// Send `value` wei to `to`, giving up at `deadline`.
    async fn transfer(&self, to: Address, value: U256, deadline: Instant) -> BlockchainResult<TxHash>;
}

/// Transaction builder bound to one signing identity.
pub struct TxBuilder {
    rpc: Arc<dyn LedgerRpc>,
    identity: SigningIdentity,
    chain_id: ChainId,
    market: FeeMarket,
}

impl TxBuilder {
    /// Seed the identity's nonce and probe the fee market once.
    pub async fn connect(
        rpc: Arc<dyn LedgerRpc>,
        signer: PrivateKeySigner,
        chain_id: ChainId,
        policy: NonceRefreshPolicy,
    ) -> BlockchainResult<Self> {
        let identity = SigningIdentity::connect(signer, rpc.clone(), policy).await?;
        let market = fees::probe_market(rpc.as_ref()).await?;

        tracing::info!(
            sender = %identity.address(),
            chain_id = chain_id.0,
            ?market,
            "Transaction builder ready"
        );

        Ok(Self::new(rpc, identity, chain_id, market))
    }

    pub fn new(rpc: Arc<dyn LedgerRpc>, identity: SigningIdentity, chain_id: ChainId, market: FeeMarket) -> Self {
        Self { rpc, identity, chain_id, market }
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    pub fn market(&self) -> FeeMarket {
        self.market
    }

    /// Build and sign a plain transfer.
    pub fn sign(&self, nonce: u64, to: Address, value: U256, fees: FeeQuote) -> BlockchainResult<TxEnvelope> {
        let signer = self.identity.signer();
        let envelope: TxEnvelope = match fees {
            FeeQuote::Legacy { gas_limit, gas_price } => {
                let mut tx = TxLegacy {
                    chain_id: Some(self.chain_id.0),
                    nonce,
                    gas_price,
                    gas_limit,
                    to: TxKind::Call(to),
                    value,
                    input: Bytes::new(),
                };
                let signature = signer
                    .sign_transaction_sync(&mut tx)
                    .map_err(|e| BlockchainError::Signing(e.to_string()))?;
                tx.into_signed(signature).into()
            }
            FeeQuote::Dynamic { gas_limit, tip_cap, fee_cap } => {
                let mut tx = TxEip1559 {
                    chain_id: self.chain_id.0,
                    nonce,
                    gas_limit,
                    max_fee_per_gas: fee_cap,
                    max_priority_fee_per_gas: tip_cap,
                    to: TxKind::Call(to),
                    value,
                    ..Default::default()
                };
                let signature = signer
                    .sign_transaction_sync(&mut tx)
                    .map_err(|e| BlockchainError::Signing(e.to_string()))?;
                tx.into_signed(signature).into()
            }
        };
        Ok(envelope)
    }

    async fn send(&self, to: Address, value: U256) -> BlockchainResult<TxHash> {
        // Quote first so a failed fee query does not burn a nonce.
        let fees = fees::quote(self.rpc.as_ref(), self.market).await?;
        let nonce = self.identity.reserve_nonce().await;
        let envelope = self.sign(nonce, to, value, fees)?;
        let tx_hash = *envelope.tx_hash();

        if let Err(e) = self.rpc.send_raw_transaction(&envelope.encoded_2718()).await {
            tracing::error!(tx_hash = %tx_hash, nonce, error = %e, "Failed to send transaction");
            return Err(e);
        }

        tracing::debug!(tx_hash = %tx_hash, nonce, to = %to, "Transaction broadcast");
        Ok(tx_hash)
    }
}

#[async_trait]
impl Transfer for TxBuilder {
    fn sender(&self) -> Address {
        self.identity.address()
    }

    async fn transfer(&self, to: Address, value: U256, deadline: Instant) -> BlockchainResult<TxHash> {
        let started = std::time::Instant::now();

        let result = match timeout_at(deadline, self.send(to, value)).await {
            Ok(result) => result,
            Err(_) => Err(BlockchainError::DeadlineExceeded),
        };

        if let Err(e) = &result {
            if e.is_nonce_conflict() {
                tracing::warn!(sender = %self.sender(), "Nonce conflict reported, resyncing");
                self.identity.resync().await;
            }
        }

        metrics::record_transfer(&self.sender(), result.is_ok(), started);
        result
    }
}

impl std::fmt::Debug for TxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxBuilder")
            .field("sender", &self.identity.address())
            .field("chain_id", &self.chain_id)
            .field("market", &self.market)
            .finish()
    }
}
