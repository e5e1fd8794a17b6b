//! Cache domain - refresh token storage abstraction

mod repository;

pub use repository::{CacheEntry, CacheIter, CacheStats, TokenCache, TokenCacheExt};

#[cfg(test)]
pub use repository::mock::MockTokenCache;
