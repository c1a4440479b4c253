//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FaucetConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//!
//! FAUCET_PRIVATE_KEYS (environment)
//!     → blockchain::wallet (never part of FaucetConfig)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    BalanceGateConfig, BlockchainConfig, FaucetConfig, FaucetPolicyConfig, ListenerConfig, ObservabilityConfig,
    TimeoutConfig,
};
