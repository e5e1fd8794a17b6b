//! Auth Token Service
//!
//! Phone-number/password authentication with:
//! - Argon2 password hashing
//! - HS256 access tokens
//! - Single-use refresh tokens held in a byte-budgeted in-memory cache

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use api::state::AppState;
use infrastructure::{
    auth::{AuthService, JwtService},
    cache::{InMemoryTokenCache, InMemoryTokenCacheConfig},
    user::{Argon2Hasher, InMemoryUserRepository},
};
use tracing::info;

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    config
        .validate()
        .context("Invalid configuration")?;

    let hasher = Argon2Hasher::with_config((&config.password).into())
        .context("Failed to build password hasher")?;

    let cache_config = InMemoryTokenCacheConfig::from(&config.cache);
    info!(
        capacity_bytes = cache_config.capacity_bytes,
        max_entry_bytes = cache_config.entry_limit(),
        "Token cache configured"
    );

    let auth_service = AuthService::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(hasher),
        Arc::new(InMemoryTokenCache::with_config(cache_config)),
        Arc::new(JwtService::new(config.auth.jwt_config())),
        config.auth.service_config(),
    );

    auth_service
        .warm_up()
        .await
        .context("Failed to prepare password verification")?;

    if config.auth.refresh_token_ttl_secs == 0 {
        info!("Refresh tokens are stored without expiry");
    }

    Ok(AppState::new(Arc::new(auth_service)))
}
