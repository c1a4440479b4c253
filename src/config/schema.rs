//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the faucet.
//! All types derive Serde traits for deserialization from config files.
//! Signing keys are deliberately absent; they are read from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the faucet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FaucetConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Payout, cooldown and queueing policy.
    pub faucet: FaucetPolicyConfig,

    /// Ledger connection settings.
    pub blockchain: BlockchainConfig,

    /// Optional minimum balance on a reference chain.
    pub balance_gate: BalanceGateConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string() }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for one claim, and for each queued transfer, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Claim policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaucetPolicyConfig {
    /// Amount paid per claim, in ether (decimal string, e.g. "0.05").
    pub payout_ether: String,

    /// Cooldown per recipient and per client, in seconds.
    pub cooldown_secs: u64,

    /// Maximum number of claims waiting for the dispatch gate.
    pub queue_capacity: usize,

    /// Number of reverse proxies in front of the faucet whose
    /// X-Forwarded-For entries are trusted. 0 trusts only the peer.
    pub proxy_count: usize,

    /// Network name shown to users and used for chain id lookup.
    pub network: String,

    /// Currency symbol shown to users.
    pub symbol: String,

    /// How often expired cooldown entries are purged, in seconds.
    pub janitor_interval_secs: u64,
}

impl Default for FaucetPolicyConfig {
    fn default() -> Self {
        Self {
            payout_ether: "1".to_string(),
            cooldown_secs: 1440 * 60,
            queue_capacity: 100,
            proxy_count: 0,
            network: "testnet".to_string(),
            symbol: "ETH".to_string(),
            janitor_interval_secs: 60,
        }
    }
}

impl FaucetPolicyConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs)
    }
}

/// Ledger connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID. When unset it is derived from the network name or queried.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Resync the nonce from the node after this many reservations. 0 disables.
    pub nonce_refresh_every: u64,

    /// Resync the nonce when this many seconds passed since the last one. 0 disables.
    pub nonce_refresh_interval_secs: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            nonce_refresh_every: 100,
            nonce_refresh_interval_secs: 300,
        }
    }
}

/// Minimum balance on a reference chain (usually mainnet).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalanceGateConfig {
    pub enabled: bool,

    /// JSON-RPC endpoint of the reference chain.
    pub rpc_url: String,

    /// Required balance, in ether.
    pub min_balance_ether: String,

    pub cache_ttl_secs: u64,

    pub cache_capacity: usize,
}

impl Default for BalanceGateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: String::new(),
            min_balance_ether: "0.001".to_string(),
            cache_ttl_secs: 60,
            cache_capacity: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
