// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every failure rather than stopping at the first.

use crate::ConfigError;
use crate::model::FerrybotConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &FerrybotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.agent.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "agent.base_url must not be empty".to_string(),
        });
    } else if !config.agent.base_url.starts_with("http://")
        && !config.agent.base_url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.base_url `{}` must start with http:// or https://",
                config.agent.base_url
            ),
        });
    }

    if config.delivery.webhook_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "delivery.webhook_timeout_secs must be at least 1".to_string(),
        });
    }

    if !config.delivery.desk_base_url.is_empty() && config.delivery.desk_api_token.is_empty() {
        errors.push(ConfigError::Validation {
            message: "delivery.desk_api_token is required when desk_base_url is set".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&FerrybotConfig::default()).is_ok());
    }

    #[test]
    fn empty_bind_address_rejected() {
        let mut config = FerrybotConfig::default();
        config.server.bind_address = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("bind_address")));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = FerrybotConfig::default();
        config.server.bind_address = String::new();
        config.storage.database_path = String::new();
        config.agent.base_url = "ftp://agent".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn desk_url_without_token_rejected() {
        let mut config = FerrybotConfig::default();
        config.delivery.desk_base_url = "https://desk.example.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("desk_api_token")));
    }
}
