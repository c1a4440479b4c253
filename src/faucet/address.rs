//! Recipient address parsing.

use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::{ClaimError, ClaimResult};

/// Parse a user-supplied recipient.
///
/// Accepts 40 hex digits with an optional `0x` prefix. All-lowercase and
/// all-uppercase input is taken as is; mixed case must be a valid EIP-55
/// checksum.
pub fn parse_recipient(raw: &str) -> ClaimResult<Address> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
    if digits.len() != 40 {
        return Err(ClaimError::InvalidAddress);
    }

    let address = Address::from_str(digits).map_err(|_| ClaimError::InvalidAddress)?;

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return Err(ClaimError::InvalidAddress);
    }

    Ok(address)
}
