//! Load balancing across funding identities.
//!
//! # Data Flow
//! ```text
//! Dispatch wants a transfer
//!     → round_robin.rs (pick the next identity)
//!     → that identity's TxBuilder (own nonce sequence)
//! ```
//!
//! # Design Decisions
//! - Each identity is nonce-safe on its own; no cross-identity coordination
//! - The rotation is itself a `Transfer`, so one key or many look the same upstream

pub mod round_robin;

pub use round_robin::RoundRobin;
