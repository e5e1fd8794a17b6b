//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_user_id, UserValidationError};

/// Role assigned to accounts created through registration
pub const DEFAULT_ROLE: &str = "user";

/// User identifier - a hyphenated UUID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        validate_user_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User entity as loaded from the user store
///
/// Treated as an immutable value once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    id: UserId,
    /// Phone number used as the login identity
    phone_number: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing, default)]
    password_hash: String,
    /// Role embedded into access tokens
    role: String,
    /// Display name
    full_name: String,
    /// Profile picture location, if one was set
    #[serde(default)]
    avatar_url: Option<String>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a freshly generated ID and the default role
    pub fn new(
        phone_number: impl Into<String>,
        password_hash: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self::with_id(
            UserId::generate(),
            phone_number,
            password_hash,
            DEFAULT_ROLE,
            full_name,
        )
    }

    /// Create a user with an explicit ID and role
    pub fn with_id(
        id: UserId,
        phone_number: impl Into<String>,
        password_hash: impl Into<String>,
        role: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            phone_number: phone_number.into(),
            password_hash: password_hash.into(),
            role: role.into(),
            full_name: full_name.into(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Copy of the user-facing fields, without the password hash
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id.clone(),
            phone_number: self.phone_number.clone(),
            role: self.role.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// By-value copy of a user taken when tokens are minted.
///
/// This is what refresh records hold: later changes to the stored user do not
/// reach sessions that are already outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: UserId,
    pub phone_number: String,
    pub role: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        user.snapshot()
    }
}
