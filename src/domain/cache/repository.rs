//! Token cache trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// A key/value pair yielded while scanning the cache
pub type CacheEntry = (Vec<u8>, Vec<u8>);

/// Single-pass scan over live cache entries
pub type CacheIter<'a> = Box<dyn Iterator<Item = CacheEntry> + 'a>;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live (non-expired, non-evicted) entries
    pub entry_count: u64,
    /// Lookups that found a live entry since the cache was created
    pub hit_count: u64,
    /// Lookups that found nothing or an expired entry since the cache was created
    pub miss_count: u64,
    /// Bytes currently charged against the budget
    pub used_bytes: u64,
    /// Total byte budget
    pub capacity_bytes: u64,
}

/// Bounded, expiring byte cache shared by every request handler
///
/// Implementations must be safe to call from any number of tasks at once.
/// A `ttl_secs` of zero means the entry carries no expiry of its own and
/// only leaves the cache when deleted, overwritten, or evicted for space.
#[async_trait]
pub trait TokenCache: Send + Sync + Debug {
    /// Gets the value for a key
    ///
    /// Fails with `NotFound` when absent and `ExpiredToken` when the entry
    /// is still held but its TTL has passed.
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, DomainError>;

    /// Inserts or overwrites a value
    async fn set(&self, key: &[u8], value: &[u8], ttl_secs: u64) -> Result<(), DomainError>;

    /// Removes a key, returning whether a live entry was removed
    async fn delete(&self, key: &[u8]) -> bool;

    /// Reads and removes a key in one atomic step.
    ///
    /// When several callers race on the same key at most one receives the value.
    async fn take(&self, key: &[u8]) -> Result<Vec<u8>, DomainError>;

    /// Drops every entry whose TTL has passed, returning how many were dropped
    async fn purge_expired(&self) -> usize;

    /// Current counters
    async fn stats(&self) -> CacheStats;

    /// Starts a fresh scan over live entries
    fn iter(&self) -> CacheIter<'_>;
}

/// Extension trait providing typed get/set operations
pub trait TokenCacheExt: TokenCache {
    /// Gets a JSON-encoded value from the cache
    fn get_json<'a, V>(
        &'a self,
        key: &'a [u8],
    ) -> impl std::future::Future<Output = Result<V, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            let data = self.get(key).await?;
            decode(&data)
        }
    }

    /// Stores a value as JSON
    fn set_json<'a, V>(
        &'a self,
        key: &'a [u8],
        value: &'a V,
        ttl_secs: u64,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_vec(value).map_err(|e| {
                DomainError::cache_write(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set(key, &data, ttl_secs).await
        }
    }

    /// Atomically removes a JSON-encoded value and decodes it
    fn take_json<'a, V>(
        &'a self,
        key: &'a [u8],
    ) -> impl std::future::Future<Output = Result<V, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            let data = self.take(key).await?;
            decode(&data)
        }
    }
}

fn decode<V: DeserializeOwned>(data: &[u8]) -> Result<V, DomainError> {
    serde_json::from_slice(data)
        .map_err(|e| DomainError::internal(format!("Failed to deserialize cache value: {}", e)))
}

// Blanket implementation for all types implementing TokenCache
impl<T: TokenCache + ?Sized> TokenCacheExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Mock cache for testing
    ///
    /// Ignores TTLs and capacity; can be told to fail every write.
    #[derive(Debug, Default)]
    pub struct MockTokenCache {
        entries: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
        write_error: Mutex<Option<String>>,
        hits: AtomicU64,
        misses: AtomicU64,
    }

    impl MockTokenCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_write_error(self, error: impl Into<String>) -> Self {
            *self.write_error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn lookup(&self, value: Option<Vec<u8>>, key: &[u8]) -> Result<Vec<u8>, DomainError> {
            match value {
                Some(v) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(v)
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    Err(DomainError::not_found(format!(
                        "No cache entry for key of {} bytes",
                        key.len()
                    )))
                }
            }
        }
    }

    #[async_trait]
    impl TokenCache for MockTokenCache {
        async fn get(&self, key: &[u8]) -> Result<Vec<u8>, DomainError> {
            let value = self.entries.lock().unwrap().get(key).cloned();
            self.lookup(value, key)
        }

        async fn set(&self, key: &[u8], value: &[u8], _ttl_secs: u64) -> Result<(), DomainError> {
            if let Some(error) = self.write_error.lock().unwrap().clone() {
                return Err(DomainError::cache_write(error));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_vec(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &[u8]) -> bool {
            self.entries.lock().unwrap().remove(key).is_some()
        }

        async fn take(&self, key: &[u8]) -> Result<Vec<u8>, DomainError> {
            let value = self.entries.lock().unwrap().remove(key);
            self.lookup(value, key)
        }

        async fn purge_expired(&self) -> usize {
            0
        }

        async fn stats(&self) -> CacheStats {
            let entries = self.entries.lock().unwrap();
            CacheStats {
                entry_count: entries.len() as u64,
                hit_count: self.hits.load(Ordering::Relaxed),
                miss_count: self.misses.load(Ordering::Relaxed),
                used_bytes: entries.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum(),
                capacity_bytes: u64::MAX,
            }
        }

        fn iter(&self) -> CacheIter<'_> {
            let snapshot: Vec<CacheEntry> = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Box::new(snapshot.into_iter())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockTokenCache::new();
            cache.set(b"key1", b"value1", 0).await.unwrap();

            assert_eq!(cache.get(b"key1").await.unwrap(), b"value1".to_vec());
        }

        #[tokio::test]
        async fn test_mock_cache_take_once() {
            let cache = MockTokenCache::new();
            cache.set(b"key1", b"value1", 0).await.unwrap();

            assert!(cache.take(b"key1").await.is_ok());
            assert!(cache.take(b"key1").await.unwrap_err().is_not_found());
        }

        #[tokio::test]
        async fn test_mock_cache_with_write_error() {
            let cache = MockTokenCache::new().with_write_error("Test error");

            let result = cache.set(b"key", b"value", 0).await;
            assert!(matches!(result, Err(DomainError::CacheWrite { .. })));
            assert_eq!(cache.len(), 0);
        }

        #[tokio::test]
        async fn test_json_helpers() {
            let cache = MockTokenCache::new();
            cache.set_json(b"n", &vec![1, 2, 3], 0).await.unwrap();

            let values: Vec<i32> = cache.get_json(b"n").await.unwrap();
            assert_eq!(values, vec![1, 2, 3]);

            let values: Vec<i32> = cache.take_json(b"n").await.unwrap();
            assert_eq!(values.len(), 3);
            assert_eq!(cache.len(), 0);
        }

        #[tokio::test]
        async fn test_json_decode_failure_is_internal() {
            let cache = MockTokenCache::new();
            cache.set(b"bad", b"not json", 0).await.unwrap();

            let result: Result<Vec<i32>, _> = cache.get_json(b"bad").await;
            assert!(matches!(result, Err(DomainError::Internal { .. })));
        }
    }
}
