//! A read-through cache for catalog responses.
//!
//! Only catalog reads are cached. Orders and balances are always read from the database.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use log::*;

/// A key-value store for serialized responses.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// An in-process [`ResponseCache`]. Each worker shares the same instance.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().ok()?;
        let expired = entries.get(key).map(|e| e.expires_at <= Instant::now())?;
        if expired {
            trace!("💻️ Cache entry for {key} has expired");
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), CachedEntry { value, expires_at: Instant::now() + ttl });
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

/// The catalog cache, as registered with the server's app data.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Arc<dyn ResponseCache>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(cache: Arc<dyn ResponseCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let hit = self.cache.get(key);
        trace!("💻️ Catalog cache {} for {key}", if hit.is_some() { "hit" } else { "miss" });
        hit
    }

    pub fn set(&self, key: &str, value: serde_json::Value) {
        if self.ttl.is_zero() {
            return;
        }
        self.cache.set(key, value, self.ttl);
    }

    pub fn clear(&self) {
        debug!("💻️ Clearing the catalog cache");
        self.cache.clear();
    }
}
