//! Abuse protection subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming claim:
//!     → client_ip.rs (derive client origin behind trusted proxies)
//!     → rate_limit.rs (cooldown per recipient and per origin)
//!     → balance_gate.rs (optional minimum balance on a reference chain)
//!     → Pass to dispatch
//! ```
//!
//! # Design Decisions
//! - Stores are explicit instances owned by the server, never globals
//! - Cooldown starts only once a claim was dispatched or queued
//! - Expiry is lazy; a claim racing an expiring entry may get through

pub mod balance_gate;
pub mod client_ip;
pub mod rate_limit;
pub mod ttl_cache;

pub use balance_gate::BalanceGate;
pub use client_ip::client_origin;
pub use rate_limit::{Admission, ClaimLimiter, ClaimSlot};
pub use ttl_cache::TtlCache;
