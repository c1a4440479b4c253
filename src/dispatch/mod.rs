//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted claim:
//!     → gate free and queue empty → transfer now → tx hash
//!     → otherwise                 → queue (bounded) → drain task → transfer
//! ```
//!
//! # Design Decisions
//! - One transfer in flight at a time, across the fast path and the drain
//! - The fast path never jumps ahead of queued recipients
//! - Queue failures are logged; the claimant has already been answered

pub mod controller;
pub mod gate;
pub mod queue;

pub use controller::{Dispatch, Dispatcher};
pub use gate::DispatchGate;
pub use queue::ClaimQueue;
