//! Claim-level error taxonomy.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;

/// Why a claim was not dispatched.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The recipient is not a well-formed address.
    #[error("invalid address")]
    InvalidAddress,

    /// The recipient or client is still cooling down.
    #[error("you have exceeded the rate limit, try again in {}s", whole_secs(.remaining))]
    RateLimited { remaining: Duration },

    /// The backlog is full.
    #[error("Faucet queue is too long, please try again later.")]
    QueueFull,

    /// The recipient does not meet the reference-chain balance requirement.
    #[error("recipient does not hold the minimum required mainnet balance")]
    InsufficientMainnetBalance,

    /// The transfer itself failed.
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
}

impl ClaimError {
    /// HTTP status reported to the claimant.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidAddress => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            Self::InsufficientMainnetBalance => StatusCode::FORBIDDEN,
            Self::Blockchain(BlockchainError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
            Self::Blockchain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "invalid_address",
            Self::RateLimited { .. } => "rate_limited",
            Self::QueueFull => "queue_full",
            Self::InsufficientMainnetBalance => "insufficient_balance",
            Self::Blockchain(BlockchainError::DeadlineExceeded) => "deadline_exceeded",
            Self::Blockchain(_) => "failed",
        }
    }
}

pub type ClaimResult<T> = Result<T, ClaimError>;

/// Seconds, rounded up.
pub fn whole_secs(duration: &Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message_rounds_up() {
        let err = ClaimError::RateLimited { remaining: Duration::from_millis(1500) };
        assert_eq!(err.to_string(), "you have exceeded the rate limit, try again in 2s");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ClaimError::InvalidAddress.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ClaimError::QueueFull.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ClaimError::Blockchain(BlockchainError::DeadlineExceeded).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_remote_error_is_surfaced() {
        let err: ClaimError = BlockchainError::Submission("nonce too low".into()).into();
        assert!(err.to_string().contains("nonce too low"));
    }
}
