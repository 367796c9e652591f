//! Cache manager for API responses
//!
//! Provides a `CacheManager` that stores serializable data in memory with
//! expiry timestamps. Nothing is written to disk; the cache lives as long as
//! the process.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Time-to-live for market and network data (prices, gas)
pub const MARKET_TTL: Duration = Duration::minutes(5);

/// Time-to-live for governance data (GitHub repository activity)
pub const GOVERNANCE_TTL: Duration = Duration::hours(1);

/// A single cached value with its timestamps
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached data, serialized
    value: Value,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

/// Result of reading from cache, including metadata about cache freshness
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the cache entry has expired
    pub is_expired: bool,
}

/// Manages reading and writing cached data
///
/// Clones share the same underlying map, so one manager can be handed to
/// every API client. Values are stored as JSON so a single cache holds
/// market, gas, and governance data side by side.
#[derive(Debug, Clone, Default)]
pub struct CacheManager {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CacheManager {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes data to the cache with the given TTL
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "gas:ethereum")
    /// * `data` - The data to cache
    /// * `ttl` - How long the entry should be considered fresh
    ///
    /// Values that fail to serialize are dropped with a warning.
    pub fn write<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        let now = Utc::now();
        let entry = CacheEntry {
            value,
            cached_at: now,
            expires_at: now + ttl,
        };

        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), entry);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key.to_string(), entry);
            }
        }
    }

    /// Reads data from the cache
    ///
    /// Returns `None` if the entry doesn't exist or cannot be deserialized as `T`.
    /// Returns `Some(CachedData)` with `is_expired = true` once the entry's age
    /// has reached its TTL.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        let entry = {
            let entries = match self.entries.read() {
                Ok(entries) => entries,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries.get(key)?.clone()
        };

        let data: T = serde_json::from_value(entry.value).ok()?;
        let is_expired = Utc::now() >= entry.expires_at;

        Some(CachedData {
            data,
            cached_at: entry.cached_at,
            is_expired,
        })
    }

    /// Reads data only if it is still fresh
    pub fn get_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        self.read(key).filter(|cached| !cached.is_expired)
    }

    /// Removes a single entry
    pub fn invalidate(&self, key: &str) {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.remove(key);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(key);
            }
        }
    }

    /// Removes every entry, forcing the next lookups upstream
    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// Number of entries currently held, fresh or not
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
