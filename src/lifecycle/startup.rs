//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect to the ledger and resolve the chain id
//! - Build one transaction builder per signing key
//! - Assemble limiter, balance gate and dispatcher into a `Faucet`
//! - Start background tasks (queue drain, cooldown janitor)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use alloy::primitives::utils::parse_ether;
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::rpc::LedgerRpc;
use crate::blockchain::transaction::{Transfer, TxBuilder};
use crate::blockchain::types::{BlockchainError, ChainId};
use crate::blockchain::wallet::NonceRefreshPolicy;
use crate::config::schema::FaucetConfig;
use crate::dispatch::Dispatcher;
use crate::faucet::Faucet;
use crate::lifecycle::shutdown::Shutdown;
use crate::load_balancer::RoundRobin;
use crate::security::{BalanceGate, ClaimLimiter};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid ether amount in {field}: {reason}")]
    InvalidAmount { field: &'static str, reason: String },

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
}

/// Connect to the configured endpoints and build the faucet.
pub async fn build_faucet(config: &FaucetConfig, signers: Vec<PrivateKeySigner>) -> Result<Faucet, StartupError> {
    let client = BlockchainClient::new(&config.blockchain)?;
    let chain_id = client
        .resolve_chain_id(config.blockchain.chain_id, &config.faucet.network)
        .await?;
    tracing::info!(rpc_url = %client.rpc_url(), chain_id = chain_id.0, "Ledger connected");

    let gate_rpc: Option<Arc<dyn LedgerRpc>> = if config.balance_gate.enabled {
        let gate_client = BlockchainClient::connect(
            &config.balance_gate.rpc_url,
            &[],
            config.blockchain.rpc_timeout_secs,
        )?;
        Some(Arc::new(gate_client))
    } else {
        None
    };

    assemble(config, Arc::new(client), chain_id, signers, gate_rpc).await
}

/// Build the faucet on top of already-connected ledgers.
pub async fn assemble(
    config: &FaucetConfig,
    rpc: Arc<dyn LedgerRpc>,
    chain_id: ChainId,
    signers: Vec<PrivateKeySigner>,
    gate_rpc: Option<Arc<dyn LedgerRpc>>,
) -> Result<Faucet, StartupError> {
    let payout = parse_amount("faucet.payout_ether", &config.faucet.payout_ether)?;
    let policy = NonceRefreshPolicy::from_config(&config.blockchain);

    let mut builders: Vec<Arc<dyn Transfer>> = Vec::with_capacity(signers.len());
    for signer in signers {
        let builder = TxBuilder::connect(rpc.clone(), signer, chain_id, policy).await?;
        builders.push(Arc::new(builder));
    }

    let transfer: Arc<dyn Transfer> = match builders.len() {
        0 => return Err(BlockchainError::NoSigningKeys.into()),
        1 => builders.remove(0),
        n => {
            tracing::info!(identities = n, "Load balancing across signing identities");
            Arc::new(RoundRobin::new(builders)?)
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        transfer,
        payout,
        config.faucet.queue_capacity,
        config.timeouts.request(),
    ));
    let limiter = Arc::new(ClaimLimiter::new(config.faucet.cooldown()));
    let mut faucet = Faucet::new(dispatcher, limiter, &config.faucet.network, &config.faucet.symbol);

    if let Some(gate_rpc) = gate_rpc {
        let gate = &config.balance_gate;
        let min_balance = parse_amount("balance_gate.min_balance_ether", &gate.min_balance_ether)?;
        faucet = faucet.with_balance_gate(BalanceGate::new(
            gate_rpc,
            min_balance,
            Duration::from_secs(gate.cache_ttl_secs),
            gate.cache_capacity,
        ));
        tracing::info!(min_balance_ether = %gate.min_balance_ether, "Mainnet balance gate enabled");
    }

    tracing::info!(
        sender = %faucet.sender(),
        payout_ether = %config.faucet.payout_ether,
        cooldown_secs = config.faucet.cooldown_secs,
        queue_capacity = config.faucet.queue_capacity,
        "Faucet ready"
    );
    Ok(faucet)
}

/// Start the queue drain and the cooldown janitor.
pub fn spawn_background_tasks(
    faucet: &Faucet,
    config: &FaucetConfig,
    shutdown: &Shutdown,
) -> Vec<tokio::task::JoinHandle<()>> {
    vec![
        faucet.dispatcher().clone().spawn_drain(shutdown.subscribe()),
        faucet
            .limiter()
            .clone()
            .spawn_janitor(config.faucet.janitor_interval(), shutdown.subscribe()),
    ]
}

fn parse_amount(field: &'static str, raw: &str) -> Result<alloy::primitives::U256, StartupError> {
    parse_ether(raw).map_err(|e| StartupError::InvalidAmount { field, reason: e.to_string() })
}
