//! TTL cache over [`Storage`].
//!
//! Entries are self-describing: each carries its own creation timestamp and
//! TTL, so different kinds of data (menu, categories, rewards) keep
//! independent freshness windows in the same store.
//!
//! Caching is best-effort. Storage failures are logged and swallowed; a
//! failed write means the next read is a miss, nothing more. There is no
//! background sweep: expired entries are deleted when they are next read.
//!
//! Concurrent misses for the same key may both fetch and both write; the last
//! write wins. Entries are idempotent reads, so this only costs a request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::storage::Storage;

/// Prefix separating cache entries from other users of the storage.
pub const CACHE_PREFIX: &str = "eathub_cache_";

/// TTL for writes that don't name one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached value as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Validity window, milliseconds.
    pub ttl: u64,
}

impl CacheEntry {
    /// Valid iff `now - timestamp <= ttl`.
    #[must_use]
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        let age = i128::from(now_millis) - i128::from(self.timestamp);
        age <= i128::from(self.ttl)
    }
}

/// Cache handle. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct TtlCache {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl TtlCache {
    /// Cache over `storage` using the system clock.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Cache over `storage` with an explicit clock.
    #[must_use]
    pub fn with_clock(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Replace the TTL used when none is given.
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn storage_key(key: &str) -> String {
        format!("{CACHE_PREFIX}{key}")
    }

    /// Store `data` under `key` for `ttl` (or the default TTL).
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "Cache value is not serializable, skipping");
                return;
            }
        };
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_millis(),
            ttl: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        };
        let encoded = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(&Self::storage_key(key), &encoded) {
            warn!(key, error = %e, "Failed to write cache entry");
        }
    }

    /// Fresh data under `key`, if any.
    ///
    /// Expired and undecodable entries are deleted and reported as absent.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = Self::storage_key(key);
        let raw = match self.storage.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Dropping malformed cache entry");
                self.remove(key);
                return None;
            }
        };

        if !entry.is_valid_at(self.clock.now_millis()) {
            debug!(key, "Cache entry expired");
            self.remove(key);
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(key, error = %e, "Cache entry has an unexpected shape");
                self.remove(key);
                None
            }
        }
    }

    /// Delete one entry.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(&Self::storage_key(key)) {
            warn!(key, error = %e, "Failed to remove cache entry");
        }
    }

    /// Delete every cache entry. Other storage namespaces are untouched.
    pub fn clear_all(&self) {
        self.remove_matching(CACHE_PREFIX);
    }

    /// Delete every entry whose key starts with `prefix`.
    ///
    /// `invalidate_pattern("menu_")` drops `menu_all`, `menu_item_3`, ... in
    /// one call, without tracking exact keys.
    pub fn invalidate_pattern(&self, prefix: &str) {
        self.remove_matching(&Self::storage_key(prefix));
    }

    fn remove_matching(&self, storage_prefix: &str) {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(prefix = storage_prefix, error = %e, "Failed to list cache keys");
                return;
            }
        };
        let mut removed = 0_usize;
        for key in keys.iter().filter(|k| k.starts_with(storage_prefix)) {
            match self.storage.remove_item(key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key, error = %e, "Failed to remove cache entry"),
            }
        }
        debug!(prefix = storage_prefix, removed, "Invalidated cache entries");
    }

    /// Get-or-populate.
    ///
    /// Returns the cached value under `key` if fresh; otherwise awaits
    /// `fetch`, stores its result for `ttl` and returns it. Fetch errors are
    /// returned unchanged and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` returns on failure.
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key) {
            debug!(key, "Cache hit");
            return Ok(hit);
        }
        debug!(key, "Cache miss");
        self.refresh(key, ttl, fetch).await
    }

    /// Forced refresh: always fetch, then overwrite the entry.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` returns on failure; the existing entry is
    /// left in place.
    pub async fn refresh<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = fetch().await?;
        self.set(key, &value, ttl);
        Ok(value)
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
