//! JWT access token signing and validation

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::fmt::Debug;

use crate::domain::{AccessClaims, DomainError, UserSnapshot};

/// Default audience tag
pub const DEFAULT_AUDIENCE: &str = "users";

/// Default access token lifetime in minutes
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: u64 = 60;

/// Upper bound applied to the configured lifetime (one year)
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: u64 = 365 * 24 * 60;

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,
    /// Audience tag embedded in and required from every token
    pub audience: String,
    /// Access token lifetime in minutes
    pub access_token_ttl_minutes: u64,
}

impl JwtConfig {
    /// Create a configuration with the default audience and lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_access_token_ttl_minutes(mut self, minutes: u64) -> Self {
        self.access_token_ttl_minutes = minutes;
        self
    }

    fn lifetime(&self) -> Duration {
        let minutes = self.access_token_ttl_minutes.min(MAX_ACCESS_TOKEN_TTL_MINUTES);
        Duration::minutes(minutes as i64)
    }
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("audience", &self.audience)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .finish()
    }
}

/// Trait for access token operations
pub trait TokenSigner: Send + Sync + Debug {
    /// Sign an access token for a user
    fn generate(&self, user: &UserSnapshot) -> Result<String, DomainError>;

    /// Validate an access token and return its claims
    fn validate(&self, token: &str) -> Result<AccessClaims, DomainError>;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);
        validation.leeway = 0;
        validation
    }
}

impl TokenSigner for JwtService {
    fn generate(&self, user: &UserSnapshot) -> Result<String, DomainError> {
        let claims = AccessClaims::new(user, &self.config.audience, self.config.lifetime());

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::token_signing(format!("Failed to sign access token: {}", e)))
    }

    fn validate(&self, token: &str) -> Result<AccessClaims, DomainError> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::ExpiredToken,
                _ => DomainError::invalid_token(format!("Invalid access token: {}", e)),
            })?;

        Ok(token_data.claims)
    }
}
