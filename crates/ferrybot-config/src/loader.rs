// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports `./ferrybot.toml` > `~/.config/ferrybot/ferrybot.toml` >
//! `/etc/ferrybot/ferrybot.toml` with environment variable overrides via
//! the `FERRYBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FerrybotConfig;

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ferrybot/ferrybot.toml` (system-wide)
/// 3. `~/.config/ferrybot/ferrybot.toml` (user XDG config)
/// 4. `./ferrybot.toml` (local directory)
/// 5. `FERRYBOT_*` environment variables
pub fn load_config() -> Result<FerrybotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FerrybotConfig::default()))
        .merge(Toml::file("/etc/ferrybot/ferrybot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("ferrybot/ferrybot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("ferrybot.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file hierarchy).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<FerrybotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FerrybotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FerrybotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FerrybotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `FERRYBOT_AGENT_BASE_URL` maps to
/// `agent.base_url`, not `agent.base.url`.
fn env_provider() -> Env {
    Env::prefixed("FERRYBOT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("agent_", "agent.", 1)
            .replacen("delivery_", "delivery.", 1);
        mapped.into()
    })
}
