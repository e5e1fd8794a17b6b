//! Domain layer - Core business logic and entities

pub mod auth;
pub mod cache;
pub mod error;
pub mod user;

pub use auth::{AccessClaims, RefreshTokenId, TokenPair};
pub use cache::{CacheStats, TokenCache, TokenCacheExt};
pub use error::DomainError;
pub use user::{User, UserId, UserRepository, UserSnapshot};
