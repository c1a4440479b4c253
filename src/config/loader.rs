//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::FaucetConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FaucetConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<FaucetConfig, ConfigError> {
    let config: FaucetConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load the file if given (defaults otherwise), apply a bind override, then validate.
pub fn resolve_config(path: Option<&Path>, bind: Option<String>) -> Result<FaucetConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => FaucetConfig::default(),
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_config("[faucet\npayout_ether = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = parse_config("[faucet]\nqueue_capacity = 0\n").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: faucet.queue_capacity: must be at least 1");
    }

    #[test]
    fn test_bind_override_is_validated() {
        let err = resolve_config(None, Some("garbage".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: listener.bind_address: not a socket address");

        let config = resolve_config(None, Some("127.0.0.1:9000".to_string())).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_override_can_fix_file_value() {
        let path = std::env::temp_dir().join(format!("faucet-bind-{}.toml", std::process::id()));
        fs::write(&path, "[listener]\nbind_address = \"nope\"\n").unwrap();

        assert!(matches!(resolve_config(Some(&path), None), Err(ConfigError::Validation(_))));
        let config = resolve_config(Some(&path), Some("0.0.0.0:8080".to_string())).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/faucet.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
