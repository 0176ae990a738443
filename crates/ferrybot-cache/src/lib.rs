// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`KeyValueCache`] implementation.
//!
//! Entries expire lazily: reads drop anything past its deadline, and every
//! write sweeps expired entries so the map stays bounded by the live
//! working set. Good enough for the 10s/60s windows the gateway uses; not a
//! general-purpose cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ferrybot_core::KeyValueCache;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local TTL cache backed by a mutex'd map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn take(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(key)?;
        (entry.expires_at > now).then_some(entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get_within_ttl() {
        let cache = MemoryCache::new();
        cache.put("k", "v", Duration::from_secs(10)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn expired_entry_is_gone() {
        let cache = MemoryCache::new();
        cache.put("k", "v", Duration::from_millis(0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn take_removes_the_entry() {
        let cache = MemoryCache::new();
        cache.put("k", "v", Duration::from_secs(10)).await;
        assert_eq!(cache.take("k").await.as_deref(), Some("v"));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn take_on_expired_entry_is_none() {
        let cache = MemoryCache::new();
        cache.put("k", "v", Duration::from_millis(0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.take("k").await, None);
    }

    #[tokio::test]
    async fn writes_sweep_expired_entries() {
        let cache = MemoryCache::new();
        cache.put("old", "v", Duration::from_millis(0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.put("new", "v", Duration::from_secs(10)).await;
        let entries = cache.entries.lock().await;
        assert!(!entries.contains_key("old"));
        assert!(entries.contains_key("new"));
    }

    #[tokio::test]
    async fn overwrite_extends_ttl() {
        let cache = MemoryCache::new();
        cache.put("k", "v1", Duration::from_millis(0)).await;
        cache.put("k", "v2", Duration::from_secs(10)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v2"));
    }
}
