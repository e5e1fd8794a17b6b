//! In-memory token cache implementation using moka

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::policy::EvictionPolicy;
use tracing::{debug, warn};

use crate::domain::cache::{CacheIter, CacheStats, TokenCache};
use crate::domain::DomainError;

/// Bytes charged per entry on top of key and value
pub const ENTRY_HEADER_BYTES: usize = 24;

/// Largest key accepted
pub const MAX_KEY_BYTES: usize = 65_535;

const DEFAULT_CAPACITY_BYTES: u64 = 100 * 1024 * 1024;

/// Configuration for in-memory token cache
#[derive(Debug, Clone)]
pub struct InMemoryTokenCacheConfig {
    /// Total byte budget across all entries
    pub capacity_bytes: u64,
    /// Per-entry ceiling (key + value); defaults to 1/1024 of the budget,
    /// capped at the budget minus `ENTRY_HEADER_BYTES`
    pub max_entry_bytes: Option<usize>,
}

impl Default for InMemoryTokenCacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            max_entry_bytes: None,
        }
    }
}

impl InMemoryTokenCacheConfig {
    /// Sets the total byte budget
    pub fn with_capacity_bytes(mut self, capacity: u64) -> Self {
        self.capacity_bytes = capacity;
        self
    }

    /// Sets the per-entry ceiling
    pub fn with_max_entry_bytes(mut self, max: usize) -> Self {
        self.max_entry_bytes = Some(max);
        self
    }

    /// Effective per-entry ceiling on key + value.
    ///
    /// Never more than the budget minus the entry header, so any entry that
    /// passes the check is admitted by the weigher.
    pub fn entry_limit(&self) -> usize {
        let fits = usize::try_from(self.capacity_bytes)
            .unwrap_or(usize::MAX)
            .saturating_sub(ENTRY_HEADER_BYTES);

        self.max_entry_bytes
            .unwrap_or((self.capacity_bytes / 1024) as usize)
            .min(fits)
    }
}

/// Value stored in moka
#[derive(Debug, Clone)]
struct CachedValue {
    data: Arc<[u8]>,
    /// Expiration timestamp (millis since epoch), `None` for no expiry
    expires_at: Option<u64>,
}

impl CachedValue {
    fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe in-memory token cache backed by moka
///
/// Entries are weighed by key + value + a fixed header and evicted in LRU
/// order once the byte budget is reached. Expiry is checked lazily: an entry
/// past its TTL reads as `ExpiredToken` until it is taken, overwritten,
/// evicted, or reclaimed by `purge_expired`.
#[derive(Debug)]
pub struct InMemoryTokenCache {
    cache: MokaCache<Vec<u8>, CachedValue>,
    config: InMemoryTokenCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryTokenCache {
    /// Creates a new cache with default configuration (100 MiB budget)
    pub fn new() -> Self {
        Self::with_config(InMemoryTokenCacheConfig::default())
    }

    /// Creates a new cache with the given configuration
    pub fn with_config(config: InMemoryTokenCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.capacity_bytes)
            .weigher(|key: &Vec<u8>, value: &CachedValue| -> u32 {
                entry_weight(key.len(), value.data.len())
            })
            .eviction_policy(EvictionPolicy::lru())
            .support_invalidation_closures()
            .build();

        Self {
            cache,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &InMemoryTokenCacheConfig {
        &self.config
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn check_sizes(&self, key: &[u8], value: &[u8]) -> Result<(), DomainError> {
        if key.len() > MAX_KEY_BYTES {
            return Err(DomainError::KeyTooLarge {
                size: key.len(),
                limit: MAX_KEY_BYTES,
            });
        }

        let limit = self.config.entry_limit();
        let size = key.len() + value.len();

        if size > limit {
            return Err(DomainError::EntryTooLarge { size, limit });
        }

        Ok(())
    }

    /// Resolves a value pulled out of moka into the lookup result
    fn resolve(&self, value: Option<CachedValue>, key: &[u8]) -> Result<Vec<u8>, DomainError> {
        match value {
            Some(value) if value.is_expired_at(Self::current_time_millis()) => {
                self.record_miss();
                Err(DomainError::ExpiredToken)
            }
            Some(value) => {
                self.record_hit();
                Ok(value.data.to_vec())
            }
            None => {
                self.record_miss();
                Err(DomainError::not_found(format!(
                    "No cache entry for key of {} bytes",
                    key.len()
                )))
            }
        }
    }
}

impl Default for InMemoryTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_weight(key_len: usize, value_len: usize) -> u32 {
    u32::try_from(ENTRY_HEADER_BYTES + key_len + value_len).unwrap_or(u32::MAX)
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, DomainError> {
        let value = self.cache.get(key).await;
        self.resolve(value, key)
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl_secs: u64) -> Result<(), DomainError> {
        self.check_sizes(key, value)?;

        let expires_at = (ttl_secs > 0)
            .then(|| Self::current_time_millis().saturating_add(ttl_secs.saturating_mul(1000)));
        let entry = CachedValue {
            data: Arc::from(value),
            expires_at,
        };

        self.cache.insert(key.to_vec(), entry).await;

        // Apply evictions now so the budget holds after every write
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> bool {
        self.cache
            .remove(key)
            .await
            .is_some_and(|v| !v.is_expired_at(Self::current_time_millis()))
    }

    async fn take(&self, key: &[u8]) -> Result<Vec<u8>, DomainError> {
        let value = self.cache.remove(key).await;
        self.resolve(value, key)
    }

    async fn purge_expired(&self) -> usize {
        let now = Self::current_time_millis();
        let expired = self
            .cache
            .iter()
            .filter(|(_, v)| v.is_expired_at(now))
            .count();

        if expired == 0 {
            return 0;
        }

        let result = self
            .cache
            .invalidate_entries_if(move |_, v: &CachedValue| v.is_expired_at(now));

        if let Err(e) = result {
            warn!("Failed to purge expired cache entries: {}", e);
            return 0;
        }

        self.cache.run_pending_tasks().await;
        debug!(purged = expired, "Purged expired cache entries");
        expired
    }

    async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;

        let now = Self::current_time_millis();
        let entry_count = self
            .cache
            .iter()
            .filter(|(_, v)| !v.is_expired_at(now))
            .count() as u64;

        CacheStats {
            entry_count,
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            used_bytes: self.cache.weighted_size(),
            capacity_bytes: self.config.capacity_bytes,
        }
    }

    fn iter(&self) -> CacheIter<'_> {
        let now = Self::current_time_millis();

        Box::new(
            self.cache
                .iter()
                .filter(move |(_, v)| !v.is_expired_at(now))
                .map(|(k, v)| (k.to_vec(), v.data.to_vec())),
        )
    }
}
