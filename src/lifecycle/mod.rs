//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Connect ledger → Build faucet → Spawn tasks → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop drain and janitor → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then ledger, then listeners
//! - Claims still queued at shutdown are dropped; nothing is persisted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
