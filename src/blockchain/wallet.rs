//! Signing identities and nonce reservation.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//!
//! # Nonce policy
//! Reservations are served from a local counter guarded by an async mutex.
//! The counter is resynced from the ledger's pending nonce at construction,
//! every `refresh_every` reservations or `refresh_interval` elapsed time
//! (whichever comes first), and on demand after a nonce conflict. A failed
//! resync keeps the local value and is only logged: reservations keep flowing
//! at the price of a possible duplicate nonce until the next good resync.
//!
//! Scheduled refreshes only move the counter forward: a lower remote value there
//! usually means reservations still on their way to the node. A resync after a
//! conflict adopts the remote value outright, which closes the gap left by a
//! reserved nonce the node never accepted.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::blockchain::rpc::LedgerRpc;
use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult};

/// Environment variable holding comma-separated funding keys.
pub const PRIVATE_KEYS_ENV_VAR: &str = "FAUCET_PRIVATE_KEYS";

/// When the local counter is refreshed from the ledger. Zero disables a trigger.
#[derive(Debug, Clone, Copy)]
pub struct NonceRefreshPolicy {
    pub refresh_every: u64,
    pub refresh_interval: Duration,
}

impl NonceRefreshPolicy {
    /// Only resync at construction and after conflicts.
    pub fn never() -> Self {
        Self { refresh_every: 0, refresh_interval: Duration::ZERO }
    }

    pub fn from_config(config: &BlockchainConfig) -> Self {
        Self {
            refresh_every: config.nonce_refresh_every,
            refresh_interval: Duration::from_secs(config.nonce_refresh_interval_secs),
        }
    }
}

#[derive(Debug)]
struct NonceState {
    next: u64,
    reserved_since_refresh: u64,
    last_refresh: Instant,
}

/// One funding key and its locally tracked nonce sequence.
pub struct SigningIdentity {
    signer: PrivateKeySigner,
    rpc: Arc<dyn LedgerRpc>,
    policy: NonceRefreshPolicy,
    state: Mutex<NonceState>,
    failed_resyncs: AtomicU64,
}

/// Parse a hex private key (with or without 0x prefix).
pub fn parse_signer(private_key_hex: &str) -> BlockchainResult<PrivateKeySigner> {
    let key_hex = private_key_hex.trim();
    let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
    // The parse error is swallowed so key material can never reach a log line.
    key_hex
        .parse()
        .map_err(|_| BlockchainError::Wallet("Invalid private key format".to_string()))
}

/// Read every funding key from `FAUCET_PRIVATE_KEYS`.
pub fn signers_from_env() -> BlockchainResult<Vec<PrivateKeySigner>> {
    let raw = std::env::var(PRIVATE_KEYS_ENV_VAR).map_err(|_| {
        BlockchainError::Wallet(format!("Environment variable {} not set", PRIVATE_KEYS_ENV_VAR))
    })?;
    signers_from_list(&raw)
}

/// Parse a comma-separated key list.
pub fn signers_from_list(raw: &str) -> BlockchainResult<Vec<PrivateKeySigner>> {
    let signers = raw
        .split(',')
        .filter(|k| !k.trim().is_empty())
        .map(parse_signer)
        .collect::<BlockchainResult<Vec<_>>>()?;
    if signers.is_empty() {
        return Err(BlockchainError::NoSigningKeys);
    }
    Ok(signers)
}

impl SigningIdentity {
    /// Create an identity and seed its counter from the ledger's pending nonce.
    pub async fn connect(
        signer: PrivateKeySigner,
        rpc: Arc<dyn LedgerRpc>,
        policy: NonceRefreshPolicy,
    ) -> BlockchainResult<Self> {
        let nonce = rpc.pending_nonce(signer.address()).await?;

        tracing::info!(address = %signer.address(), nonce, "Signing identity initialized");

        Ok(Self::with_nonce(signer, rpc, policy, nonce))
    }

    /// Create an identity with a known starting nonce.
    pub fn with_nonce(
        signer: PrivateKeySigner,
        rpc: Arc<dyn LedgerRpc>,
        policy: NonceRefreshPolicy,
        nonce: u64,
    ) -> Self {
        Self {
            signer,
            rpc,
            policy,
            state: Mutex::new(NonceState {
                next: nonce,
                reserved_since_refresh: 0,
                last_refresh: Instant::now(),
            }),
            failed_resyncs: AtomicU64::new(0),
        }
    }

    /// Get the identity's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Hand out the next nonce. Never fails: a due resync that errors is logged.
    pub async fn reserve_nonce(&self) -> u64 {
        let mut state = self.state.lock().await;

        state.reserved_since_refresh += 1;
        if self.refresh_due(&state) {
            self.refresh_locked(&mut state, false).await;
        }

        let nonce = state.next;
        state.next += 1;
        tracing::trace!(address = %self.address(), nonce, "Nonce reserved");
        nonce
    }

    /// Reset the counter to the ledger's pending nonce, even when that is lower.
    /// Concurrent reservations wait for it.
    pub async fn resync(&self) {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state, true).await;
    }

    /// Next nonce that would be handed out, without reserving it.
    pub async fn current_nonce(&self) -> u64 {
        self.state.lock().await.next
    }

    /// Resyncs that could not reach the ledger since construction.
    pub fn failed_resyncs(&self) -> u64 {
        self.failed_resyncs.load(Ordering::Relaxed)
    }

    fn refresh_due(&self, state: &NonceState) -> bool {
        let by_count = self.policy.refresh_every > 0 && state.reserved_since_refresh >= self.policy.refresh_every;
        let by_time = !self.policy.refresh_interval.is_zero()
            && state.last_refresh.elapsed() >= self.policy.refresh_interval;
        by_count || by_time
    }

    async fn refresh_locked(&self, state: &mut NonceState, adopt_remote: bool) {
        match self.rpc.pending_nonce(self.address()).await {
            Ok(remote) => {
                if remote != state.next {
                    tracing::debug!(address = %self.address(), local = state.next, remote, adopt_remote, "Nonce resynced");
                }
                state.next = if adopt_remote { remote } else { state.next.max(remote) };
                crate::observability::metrics::record_nonce_resync(&self.address(), true);
            }
            Err(e) => {
                tracing::warn!(address = %self.address(), error = %e, "Failed to resync nonce, keeping local value");
                self.failed_resyncs.fetch_add(1, Ordering::Relaxed);
                crate::observability::metrics::record_nonce_resync(&self.address(), false);
            }
        }
        state.reserved_since_refresh = 0;
        state.last_refresh = Instant::now();
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
