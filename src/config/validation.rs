//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity >= 1)
//! - Check that amounts and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FaucetConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::utils::parse_ether;
use std::net::SocketAddr;

use crate::config::schema::FaucetConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &FaucetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    match parse_ether(&config.faucet.payout_ether) {
        Ok(amount) if amount.is_zero() => {
            errors.push(ValidationError::new("faucet.payout_ether", "must be greater than 0"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("faucet.payout_ether", e.to_string())),
    }

    if config.faucet.queue_capacity == 0 {
        errors.push(ValidationError::new("faucet.queue_capacity", "must be at least 1"));
    }

    if config.faucet.janitor_interval_secs == 0 {
        errors.push(ValidationError::new("faucet.janitor_interval_secs", "must be greater than 0"));
    }

    check_url(&mut errors, "blockchain.rpc_url", &config.blockchain.rpc_url);
    for url in &config.blockchain.failover_urls {
        check_url(&mut errors, "blockchain.failover_urls", url);
    }

    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }

    let gate = &config.balance_gate;
    if gate.enabled {
        check_url(&mut errors, "balance_gate.rpc_url", &gate.rpc_url);
        if let Err(e) = parse_ether(&gate.min_balance_ether) {
            errors.push(ValidationError::new("balance_gate.min_balance_ether", e.to_string()));
        }
        if gate.cache_capacity == 0 {
            errors.push(ValidationError::new("balance_gate.cache_capacity", "must be at least 1"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, raw: &str) {
    if raw.trim().is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    } else if let Err(e) = url::Url::parse(raw) {
        errors.push(ValidationError::new(field, format!("invalid URL: {}", e)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&FaucetConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = FaucetConfig::default();
        config.faucet.payout_ether = "0".into();
        config.faucet.queue_capacity = 0;
        config.timeouts.request_secs = 0;
        config.blockchain.rpc_url = "not a url".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["timeouts.request_secs", "faucet.payout_ether", "faucet.queue_capacity", "blockchain.rpc_url"]
        );
    }

    #[test]
    fn test_gate_requires_url_only_when_enabled() {
        let mut config = FaucetConfig::default();
        assert!(validate_config(&config).is_ok());

        config.balance_gate.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "balance_gate.rpc_url");
    }

    #[test]
    fn test_rejects_malformed_payout() {
        let mut config = FaucetConfig::default();
        config.faucet.payout_ether = "lots".into();
        assert_eq!(validate_config(&config).unwrap_err()[0].field, "faucet.payout_ether");
    }
}
