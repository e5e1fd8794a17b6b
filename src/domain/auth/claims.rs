//! Access token claims

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserSnapshot;

/// Claims embedded in every signed access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// User role
    pub role: String,
    /// Audience tag
    pub aud: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

impl AccessClaims {
    /// Build claims for a user; expiry is always derived from the mint time
    pub fn new(user: &UserSnapshot, audience: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        let exp = now + lifetime;

        Self {
            sub: user.id.as_str().to_string(),
            role: user.role.clone(),
            aud: audience.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get user ID from claims
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}
