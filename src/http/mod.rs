//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, claim body)
//!     → faucet::Faucet (claim / info)
//!     → response.rs (JSON body, status mapping)
//!     → Send to client
//! ```
//!
//! # Endpoints
//! - `POST /api/claim` `{"address": "0x…"}` → `{"msg": …, "tx_hash"?: …}`
//! - `GET /api/info` → `{"account", "network", "payout", "symbol"}`
//! - `GET /health`

pub mod request;
pub mod response;
pub mod server;

pub use request::{ClaimRequest, MakeRequestUuid, X_REQUEST_ID};
pub use response::ClaimResponse;
pub use server::{AppState, HttpServer};
