//! Claim facade.
//!
//! # Data Flow
//! ```text
//! claim(raw address, client origin)
//!     → address.rs (parse, checksum)
//!     → security::ClaimLimiter (cooldown per address and origin)
//!     → security::BalanceGate (optional)
//!     → dispatch::Dispatcher (fund now or queue)
//!     → cooldown recorded
//! ```

pub mod address;

use alloy::primitives::utils::format_ether;
use alloy::primitives::Address;
use serde::Serialize;
use std::sync::Arc;

use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::{ClaimError, ClaimResult};
use crate::observability::metrics;
use crate::security::{BalanceGate, ClaimLimiter};

pub use address::parse_recipient;

/// Public description of the faucet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaucetInfo {
    pub account: String,
    pub network: String,
    pub payout: String,
    pub symbol: String,
}

pub struct Faucet {
    dispatcher: Arc<Dispatcher>,
    limiter: Arc<ClaimLimiter>,
    balance_gate: Option<BalanceGate>,
    network: String,
    symbol: String,
}

impl Faucet {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        limiter: Arc<ClaimLimiter>,
        network: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            limiter,
            balance_gate: None,
            network: network.into(),
            symbol: symbol.into(),
        }
    }

    pub fn with_balance_gate(mut self, gate: BalanceGate) -> Self {
        self.balance_gate = Some(gate);
        self
    }

    /// Validate, rate-limit and dispatch one claim.
    pub async fn claim(&self, raw_address: &str, origin: &str) -> ClaimResult<Dispatch> {
        let result = self.admit_and_dispatch(raw_address, origin).await;
        let outcome = match &result {
            Ok(Dispatch::Funded(_)) => "funded",
            Ok(Dispatch::Queued { .. }) => "queued",
            Err(e) => e.outcome(),
        };
        metrics::record_claim(outcome);
        result
    }

    async fn admit_and_dispatch(&self, raw_address: &str, origin: &str) -> ClaimResult<Dispatch> {
        let recipient = parse_recipient(raw_address)?;
        let key = recipient.to_checksum(None);

        let slot = self
            .limiter
            .reserve(&key, origin)
            .map_err(|remaining| ClaimError::RateLimited { remaining })?;

        if let Some(gate) = &self.balance_gate {
            if !gate.is_eligible(recipient).await? {
                tracing::info!(address = %key, "Recipient below minimum mainnet balance");
                return Err(ClaimError::InsufficientMainnetBalance);
            }
        }

        let dispatch = match self.dispatcher.submit(recipient).await {
            Ok(dispatch) => dispatch,
            Err(e) => {
                tracing::error!(address = %key, error = %e, "Could not dispatch claim");
                return Err(e);
            }
        };

        slot.complete();
        Ok(dispatch)
    }

    pub fn info(&self) -> FaucetInfo {
        FaucetInfo {
            account: self.sender().to_checksum(None),
            network: self.network.clone(),
            payout: trim_ether(&format_ether(self.dispatcher.payout())),
            symbol: self.symbol.clone(),
        }
    }

    /// Address funds currently go out from. Approximate when keys rotate.
    pub fn sender(&self) -> Address {
        self.dispatcher.sender()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn limiter(&self) -> &Arc<ClaimLimiter> {
        &self.limiter
    }
}

impl std::fmt::Debug for Faucet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Faucet")
            .field("network", &self.network)
            .field("dispatcher", &self.dispatcher)
            .field("balance_gate", &self.balance_gate)
            .finish()
    }
}

/// "1.500000000000000000" → "1.5", "2.000000000000000000" → "2".
fn trim_ether(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => formatted.to_string(),
    }
}
