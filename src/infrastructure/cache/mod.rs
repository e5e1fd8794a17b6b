//! Cache infrastructure - token cache implementations

mod in_memory;

pub use in_memory::{
    InMemoryTokenCache, InMemoryTokenCacheConfig, ENTRY_HEADER_BYTES, MAX_KEY_BYTES,
};
