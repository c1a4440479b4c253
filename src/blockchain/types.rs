//! Chain-specific types and error definitions.

use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Gas units consumed by a plain value transfer with no calldata.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Chain ID of a well-known public test network, looked up by name.
    pub fn from_network_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "goerli" => Some(Self(5)),
            "sepolia" => Some(Self(11_155_111)),
            "holesky" => Some(Self(17_000)),
            "auroria" => Some(Self(205_205)),
            _ => None,
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Fee market model exposed by the connected network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeMarket {
    /// Single gas price per unit.
    Legacy,
    /// Protocol base fee plus a priority tip (EIP-1559).
    Dynamic,
}

/// Fee parameters for one transfer. Never cached between transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeQuote {
    Legacy {
        gas_limit: u64,
        gas_price: u128,
    },
    Dynamic {
        gas_limit: u64,
        tip_cap: u128,
        fee_cap: u128,
    },
}

impl FeeQuote {
    pub fn gas_limit(&self) -> u64 {
        match self {
            FeeQuote::Legacy { gas_limit, .. } | FeeQuote::Dynamic { gas_limit, .. } => *gas_limit,
        }
    }

    pub fn market(&self) -> FeeMarket {
        match self {
            FeeQuote::Legacy { .. } => FeeMarket::Legacy,
            FeeQuote::Dynamic { .. } => FeeMarket::Dynamic,
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The caller's deadline expired before the transfer completed.
    #[error("deadline exceeded before the transfer completed")]
    DeadlineExceeded,

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Transaction signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The ledger rejected the signed transaction.
    #[error("Transaction rejected: {0}")]
    Submission(String),

    /// No funding keys were configured.
    #[error("no private keys provided")]
    NoSigningKeys,

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Whether the ledger refused the transaction because of its nonce.
    pub fn is_nonce_conflict(&self) -> bool {
        match self {
            BlockchainError::Submission(msg) | BlockchainError::Rpc(msg) => {
                msg.to_ascii_lowercase().contains("nonce")
            }
            _ => false,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_known_networks() {
        assert_eq!(ChainId::from_network_name("Sepolia"), Some(ChainId(11_155_111)));
        assert_eq!(ChainId::from_network_name("goerli"), Some(ChainId(5)));
        assert_eq!(ChainId::from_network_name("devnet"), None);
    }

    #[test]
    fn test_nonce_conflict_detection() {
        let err = BlockchainError::Submission("nonce too low: next nonce 7, tx nonce 5".into());
        assert!(err.is_nonce_conflict());

        let err = BlockchainError::Submission("Nonce Too High".into());
        assert!(err.is_nonce_conflict());

        let err = BlockchainError::Submission("insufficient funds for gas * price + value".into());
        assert!(!err.is_nonce_conflict());

        assert!(!BlockchainError::DeadlineExceeded.is_nonce_conflict());
    }

    #[test]
    fn test_fee_quote_accessors() {
        let quote = FeeQuote::Dynamic { gas_limit: TRANSFER_GAS_LIMIT, tip_cap: 2, fee_cap: 22 };
        assert_eq!(quote.gas_limit(), 21_000);
        assert_eq!(quote.market(), FeeMarket::Dynamic);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");
        assert_eq!(BlockchainError::NoSigningKeys.to_string(), "no private keys provided");
    }
}
