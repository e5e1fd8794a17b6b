//! Authentication service
//!
//! Verifies credentials against the user store, mints access tokens, and
//! keeps the refresh record for every issued token in the token cache.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::user::{
    validate_full_name, validate_password, validate_password_confirmation, validate_phone_number,
};
use crate::domain::{
    AccessClaims, CacheStats, DomainError, RefreshTokenId, TokenCache, TokenCacheExt, TokenPair,
    User, UserId, UserRepository, UserSnapshot,
};
use crate::infrastructure::user::PasswordHasher;

use super::jwt::TokenSigner;

/// Message used for every credential failure so that callers cannot tell
/// an unknown phone number from a wrong password.
const CREDENTIALS_NOT_FOUND: &str = "No user matches the given credentials";

/// Password behind the stand-in hash checked when no user matches
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-users";

/// Settings owned by the service itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthServiceConfig {
    /// TTL applied to refresh records; 0 stores them without expiry
    pub refresh_token_ttl_secs: u64,
}

impl AuthServiceConfig {
    pub fn new(refresh_token_ttl_secs: u64) -> Self {
        Self {
            refresh_token_ttl_secs,
        }
    }
}

/// Request for registering a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
    pub repeat_password: String,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    cache: Arc<dyn TokenCache>,
    signer: Arc<dyn TokenSigner>,
    config: AuthServiceConfig,
    /// Hash made by `hasher` once, verified against on lookup misses
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        cache: Arc<dyn TokenCache>,
        signer: Arc<dyn TokenSigner>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            users,
            hasher,
            cache,
            signer,
            config,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn config(&self) -> &AuthServiceConfig {
        &self.config
    }

    /// Make the stand-in hash used on lookup misses ahead of the first login
    pub async fn warm_up(&self) -> Result<(), DomainError> {
        self.dummy_hash().await.map(|_| ())
    }

    /// Look up a user by phone number and check the password.
    ///
    /// An unknown phone number and a wrong password fail identically with `NotFound`,
    /// and both pay for one Argon2 verification.
    pub async fn verify_credentials(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let Some(user) = self.users.get_by_phone_number(phone_number).await? else {
            self.verify_against_dummy(password).await;
            return Err(DomainError::not_found(CREDENTIALS_NOT_FOUND));
        };

        match self.verify_password(password, user.password_hash()).await {
            Ok(()) => Ok(user),
            Err(DomainError::PasswordMismatch) => {
                debug!(user_id = %user.id(), "Password verification failed");
                Err(DomainError::not_found(CREDENTIALS_NOT_FOUND))
            }
            Err(e) => Err(e),
        }
    }

    /// Mint an access token for a user and store its refresh record
    pub async fn issue_access_token(&self, user: &User) -> Result<TokenPair, DomainError> {
        self.issue_for_snapshot(&user.snapshot()).await
    }

    /// Consume a refresh token id and mint a fresh token pair for the same user.
    ///
    /// The old id is gone once this returns, whether or not signing succeeds.
    pub async fn rotate_refresh_token(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let snapshot: UserSnapshot = self.cache.take_json(refresh_token.as_bytes()).await?;

        debug!(user_id = %snapshot.id, "Refresh token consumed");

        self.issue_for_snapshot(&snapshot).await
    }

    /// Register a new user, returning the generated ID
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserId, DomainError> {
        validate_phone_number(&request.phone_number)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_full_name(&request.full_name)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password_confirmation(&request.password, &request.repeat_password)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        if self.users.phone_number_exists(&request.phone_number).await? {
            return Err(DomainError::conflict("Phone number is already registered"));
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = User::new(request.phone_number, password_hash, request.full_name);

        let user = self.users.create(user).await?;

        info!(user_id = %user.id(), "User created");

        Ok(user.id().clone())
    }

    /// Verify credentials and issue a token pair in one step
    pub async fn login(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<(User, TokenPair), DomainError> {
        let user = self.verify_credentials(phone_number, password).await?;
        let tokens = self.issue_access_token(&user).await?;

        info!(user_id = %user.id(), "User logged in");

        Ok((user, tokens))
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: &str) -> Result<User, DomainError> {
        let user_id = UserId::new(id).map_err(|e| DomainError::validation(e.to_string()))?;

        self.users
            .get(&user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    /// Check an access token's signature, audience, and expiry
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, DomainError> {
        self.signer.validate(token)
    }

    /// Invalidate a refresh token id without issuing a new one
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> bool {
        let revoked = self.cache.delete(refresh_token.as_bytes()).await;
        if revoked {
            debug!("Refresh token revoked");
        }
        revoked
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Drop expired refresh records
    pub async fn purge_expired_tokens(&self) -> usize {
        self.cache.purge_expired().await
    }

    async fn issue_for_snapshot(&self, snapshot: &UserSnapshot) -> Result<TokenPair, DomainError> {
        let token = self.signer.generate(snapshot)?;
        let refresh_token = RefreshTokenId::generate();

        // No refresh record means no token
        if let Err(e) = self
            .cache
            .set_json(refresh_token.as_bytes(), snapshot, self.config.refresh_token_ttl_secs)
            .await
        {
            warn!(user_id = %snapshot.id, error = %e, "Failed to store refresh record");
            return Err(match e {
                DomainError::CacheWrite { .. } => e,
                other => DomainError::cache_write(other.to_string()),
            });
        }

        debug!(user_id = %snapshot.id, "Access token issued");

        Ok(TokenPair {
            token,
            refresh_token,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn dummy_hash(&self) -> Result<&str, DomainError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await?;

        Ok(hash.as_str())
    }

    async fn verify_against_dummy(&self, password: &str) {
        let hash = match self.dummy_hash().await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(error = %e, "Failed to prepare dummy password hash");
                return;
            }
        };

        // Outcome is discarded
        let _ = self.verify_password(password, hash).await;
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<(), DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                DomainError::internal(format!("Password verification task failed: {}", e))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockTokenCache;
    use crate::domain::user::MockUserRepository;
    use crate::infrastructure::auth::MockTokenSigner;
    use crate::infrastructure::auth::{JwtConfig, JwtService};
    use crate::infrastructure::cache::{
        InMemoryTokenCache, InMemoryTokenCacheConfig, ENTRY_HEADER_BYTES,
    };
    use crate::infrastructure::user::{Argon2Hasher, PasswordHashConfig};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_hasher() -> Arc<dyn PasswordHasher> {
        Arc::new(
            Argon2Hasher::with_config(PasswordHashConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap(),
        )
    }

    fn signer() -> Arc<dyn TokenSigner> {
        Arc::new(JwtService::new(JwtConfig::new("test-secret")))
    }

    fn create_service_with(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn TokenCache>,
        signer: Arc<dyn TokenSigner>,
        refresh_token_ttl_secs: u64,
    ) -> AuthService {
        AuthService::new(
            users,
            fast_hasher(),
            cache,
            signer,
            AuthServiceConfig::new(refresh_token_ttl_secs),
        )
    }

    fn create_service() -> AuthService {
        create_service_with(
            Arc::new(MockUserRepository::new()),
            Arc::new(InMemoryTokenCache::new()),
            signer(),
            0,
        )
    }

    fn create_request(phone_number: &str, password: &str, repeat_password: &str) -> CreateUserRequest {
        CreateUserRequest {
            full_name: "Test User".to_string(),
            phone_number: phone_number.to_string(),
            password: password.to_string(),
            repeat_password: repeat_password.to_string(),
        }
    }

    async fn create_user(service: &AuthService, phone_number: &str) -> User {
        let id = service
            .create_user(create_request(phone_number, "secret1", "secret1"))
            .await
            .unwrap();
        service.get_user(id.as_str()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user_and_verify_credentials() {
        let service = create_service();

        let id = service
            .create_user(create_request("700", "secret1", "secret1"))
            .await
            .unwrap();
        assert!(!id.as_str().is_empty());

        let user = service.verify_credentials("700", "secret1").await.unwrap();
        assert_eq!(user.id(), &id);
        assert_eq!(user.phone_number(), "700");
        assert_eq!(user.role(), "user");

        let result = service.verify_credentials("700", "wrong").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let service = create_service();
        create_user(&service, "700").await;

        let unknown = service.verify_credentials("701", "secret1").await.unwrap_err();
        let wrong = service.verify_credentials("700", "wrong").await.unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.public_message(), wrong.public_message());
    }

    /// Hasher that counts calls before delegating
    #[derive(Debug)]
    struct CountingHasher {
        inner: Arc<dyn PasswordHasher>,
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    impl CountingHasher {
        fn new() -> Self {
            Self {
                inner: fast_hasher(),
                hashes: AtomicUsize::new(0),
                verifies: AtomicUsize::new(0),
            }
        }
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> Result<String, DomainError> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            self.inner.hash(password)
        }

        fn verify(&self, password: &str, hash: &str) -> Result<(), DomainError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, hash)
        }
    }

    #[tokio::test]
    async fn test_unknown_phone_number_still_runs_verification() {
        let hasher = Arc::new(CountingHasher::new());
        let service = AuthService::new(
            Arc::new(MockUserRepository::new()),
            hasher.clone(),
            Arc::new(InMemoryTokenCache::new()),
            signer(),
            AuthServiceConfig::new(0),
        );

        service.warm_up().await.unwrap();
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 0);

        let result = service.verify_credentials("700", "secret1").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);

        // The stand-in hash is made once and shared by clones
        let clone = service.clone();
        let result = clone.verify_credentials("701", "secret1").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stored_password_is_hashed() {
        let service = create_service();
        let user = create_user(&service, "700").await;

        assert_ne!(user.password_hash(), "secret1");
        assert!(!user.password_hash().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_password_mismatch() {
        let service = create_service();

        let result = service
            .create_user(create_request("700", "secret1", "secret2"))
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));

        let lookup = service.verify_credentials("700", "secret1").await;
        assert!(matches!(lookup, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_user_invalid_phone_number() {
        let service = create_service();

        let result = service
            .create_user(create_request("70a", "secret1", "secret1"))
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_phone_number() {
        let service = create_service();
        create_user(&service, "700").await;

        let result = service
            .create_user(create_request("700", "other", "other"))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_create_user_store_failure() {
        let users = Arc::new(MockUserRepository::new());
        users.set_should_fail(true).await;
        let service = create_service_with(
            users,
            Arc::new(MockTokenCache::new()),
            signer(),
            0,
        );

        let result = service
            .create_user(create_request("700", "secret1", "secret1"))
            .await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_issue_and_rotate() {
        let service = create_service();
        let user = create_user(&service, "700").await;

        let first = service.issue_access_token(&user).await.unwrap();
        let second = service
            .rotate_refresh_token(first.refresh_token.as_str())
            .await
            .unwrap();

        assert_ne!(second.refresh_token, first.refresh_token);

        let claims = service.validate_access_token(&second.token).unwrap();
        assert_eq!(claims.sub, user.id().as_str());
        assert_eq!(claims.role, user.role());
        assert_eq!(claims.aud, "users");

        let replay = service
            .rotate_refresh_token(first.refresh_token.as_str())
            .await;
        assert!(matches!(replay, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_refresh_record_holds_snapshot() {
        let cache = Arc::new(MockTokenCache::new());
        let service = create_service_with(
            Arc::new(MockUserRepository::new()),
            cache.clone(),
            signer(),
            0,
        );
        let user = create_user(&service, "700").await;

        let pair = service.issue_access_token(&user).await.unwrap();

        let stored: UserSnapshot = cache.get_json(pair.refresh_token.as_bytes()).await.unwrap();
        assert_eq!(stored, user.snapshot());

        let raw = cache.get(pair.refresh_token.as_bytes()).await.unwrap();
        let raw = String::from_utf8(raw).unwrap();
        assert!(!raw.contains(user.password_hash()));
    }

    #[tokio::test]
    async fn test_refresh_ids_are_unique() {
        let service = create_service();
        let user = create_user(&service, "700").await;

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let pair = service.issue_access_token(&user).await.unwrap();
            assert!(seen.insert(pair.refresh_token));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotation_has_single_winner() {
        let service = Arc::new(create_service());
        let user = create_user(&service, "700").await;
        let pair = service.issue_access_token(&user).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let refresh_token = pair.refresh_token.clone();
            handles.push(tokio::spawn(async move {
                service.rotate_refresh_token(refresh_token.as_str()).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(
                    e,
                    DomainError::NotFound { .. } | DomainError::ExpiredToken
                )),
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_discards_token() {
        let service = create_service_with(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockTokenCache::new().with_write_error("cache full")),
            signer(),
            0,
        );
        let user = create_user(&service, "700").await;

        let result = service.issue_access_token(&user).await;
        assert!(matches!(result, Err(DomainError::CacheWrite { .. })));
    }

    #[tokio::test]
    async fn test_oversized_refresh_record_reported_as_cache_write() {
        let cache = InMemoryTokenCache::with_config(
            InMemoryTokenCacheConfig::default().with_max_entry_bytes(64),
        );
        let service = create_service_with(
            Arc::new(MockUserRepository::new()),
            Arc::new(cache),
            signer(),
            0,
        );
        let user = create_user(&service, "700").await;

        let result = service.issue_access_token(&user).await;
        assert!(matches!(result, Err(DomainError::CacheWrite { .. })));
    }

    fn service_with_budget(capacity_bytes: u64, max_entry_bytes: usize) -> AuthService {
        let cache = InMemoryTokenCache::with_config(
            InMemoryTokenCacheConfig::default()
                .with_capacity_bytes(capacity_bytes)
                .with_max_entry_bytes(max_entry_bytes),
        );
        create_service_with(
            Arc::new(MockUserRepository::new()),
            Arc::new(cache),
            signer(),
            0,
        )
    }

    #[tokio::test]
    async fn test_issued_token_always_has_refresh_path_at_budget_edge() {
        let user = User::new("700", "hash", "Test User");
        let record_bytes = 36 + serde_json::to_vec(&user.snapshot()).unwrap().len();

        // Key + value fits the ceiling but the weighed entry would not fit the budget
        let tight = (record_bytes + 10) as u64;
        let service = service_with_budget(tight, record_bytes + 10);
        let result = service.issue_access_token(&user).await;
        assert!(matches!(result, Err(DomainError::CacheWrite { .. })));

        // Exactly enough room for the header
        let exact = (record_bytes + ENTRY_HEADER_BYTES) as u64;
        let service = service_with_budget(exact, record_bytes);
        let tokens = service.issue_access_token(&user).await.unwrap();

        let rotated = service
            .rotate_refresh_token(tokens.refresh_token.as_str())
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_signing_failure() {
        let signer = Arc::new(MockTokenSigner::new());
        let cache = Arc::new(MockTokenCache::new());
        let service = create_service_with(
            Arc::new(MockUserRepository::new()),
            cache.clone(),
            signer.clone(),
            0,
        );
        let user = create_user(&service, "700").await;

        signer.set_should_fail(true);

        let result = service.issue_access_token(&user).await;
        assert!(matches!(result, Err(DomainError::TokenSigning { .. })));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_rotate_unknown_token() {
        let service = create_service();

        let result = service.rotate_refresh_token("not-a-refresh-token").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rotate_expired_token() {
        let service = create_service_with(
            Arc::new(MockUserRepository::new()),
            Arc::new(InMemoryTokenCache::new()),
            signer(),
            1,
        );
        let user = create_user(&service, "700").await;
        let pair = service.issue_access_token(&user).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let result = service.rotate_refresh_token(pair.refresh_token.as_str()).await;
        assert!(matches!(result, Err(DomainError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_login() {
        let service = create_service();
        let created = create_user(&service, "700").await;

        let (user, pair) = service.login("700", "secret1").await.unwrap();
        assert_eq!(user.id(), created.id());

        let claims = service.validate_access_token(&pair.token).unwrap();
        assert_eq!(claims.user_id(), created.id().as_str());

        assert!(service.login("700", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn test_revoke_refresh_token() {
        let service = create_service();
        let user = create_user(&service, "700").await;
        let pair = service.issue_access_token(&user).await.unwrap();

        assert!(service.revoke_refresh_token(pair.refresh_token.as_str()).await);
        assert!(!service.revoke_refresh_token(pair.refresh_token.as_str()).await);

        let result = service.rotate_refresh_token(pair.refresh_token.as_str()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_user() {
        let service = create_service();
        let user = create_user(&service, "700").await;

        let found = service.get_user(user.id().as_str()).await.unwrap();
        assert_eq!(found.phone_number(), "700");

        let missing = service.get_user(UserId::generate().as_str()).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));

        let malformed = service.get_user("not-a-uuid").await;
        assert!(matches!(malformed, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_cache_stats_track_rotation() {
        let service = create_service();
        let user = create_user(&service, "700").await;
        let pair = service.issue_access_token(&user).await.unwrap();

        service
            .rotate_refresh_token(pair.refresh_token.as_str())
            .await
            .unwrap();
        let _ = service
            .rotate_refresh_token(pair.refresh_token.as_str())
            .await;

        let stats = service.cache_stats().await;
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }
}
