//! Ethereum test-network faucet library.

pub mod blockchain;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod faucet;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod security;

pub use config::schema::FaucetConfig;
pub use error::{ClaimError, ClaimResult};
pub use faucet::Faucet;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
