// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ferrybot gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Ferrybot configuration.
///
/// Loaded from TOML with environment variable overrides. All sections are
/// optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FerrybotConfig {
    /// HTTP server settings for the inbound callback endpoint.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound connection to the IM-automation agent.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Downstream delivery settings (webhooks, desk sync).
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Inbound HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the callback listener on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Listener port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// IM-automation agent connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Base URL of the agent's command API.
    #[serde(default = "default_agent_url")]
    pub base_url: String,

    /// Timeout for agent command calls, in seconds.
    #[serde(default = "default_agent_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_url(),
            request_timeout_secs: default_agent_timeout(),
        }
    }
}

/// Downstream delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Timeout for webhook POSTs, in seconds.
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// User-Agent header sent on webhook deliveries.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL of the support-desk API; empty disables desk sync globally.
    #[serde(default)]
    pub desk_base_url: String,

    /// API token for the support-desk API.
    #[serde(default)]
    pub desk_api_token: String,

    /// Poll interval of the background job worker, in seconds.
    #[serde(default = "default_job_poll_secs")]
    pub job_poll_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_timeout_secs: default_webhook_timeout(),
            user_agent: default_user_agent(),
            desk_base_url: String::new(),
            desk_api_token: String::new(),
            job_poll_secs: default_job_poll_secs(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8321
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_path() -> String {
    "ferrybot.db".to_string()
}

fn default_agent_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_agent_timeout() -> u64 {
    15
}

fn default_webhook_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "ferrybot-webhook/0.1".to_string()
}

fn default_job_poll_secs() -> u64 {
    2
}
