// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-TTL key/value cache used for de-dup windows and voice lookups.

use std::time::Duration;

use async_trait::async_trait;

/// A best-effort TTL cache.
///
/// Used for the keyword-reply de-dup window (10s) and the voice-message
/// transcript handoff (60s). Expiry is advisory: entries must be gone after
/// their TTL, but a true race between writers may still double-observe a
/// key, which the gateway accepts.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Store `value` under `key` for at most `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration);

    /// Fetch a live entry.
    async fn get(&self, key: &str) -> Option<String>;

    /// Fetch and remove a live entry in one step.
    async fn take(&self, key: &str) -> Option<String>;
}
