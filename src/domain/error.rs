use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Hashing error: {message}")]
    Hashing { message: String },

    #[error("Token signing error: {message}")]
    TokenSigning { message: String },

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Cache write error: {message}")]
    CacheWrite { message: String },

    #[error("Cache entry too large: {size} bytes exceeds limit of {limit} bytes")]
    EntryTooLarge { size: usize, limit: usize },

    #[error("Cache key too large: {size} bytes exceeds limit of {limit} bytes")]
    KeyTooLarge { size: usize, limit: usize },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    pub fn token_signing(message: impl Into<String>) -> Self {
        Self::TokenSigning {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    pub fn cache_write(message: impl Into<String>) -> Self {
        Self::CacheWrite {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Small stable code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::Conflict { .. } => "conflict",
            Self::PasswordMismatch => "password_mismatch",
            Self::Hashing { .. } => "hashing_error",
            Self::TokenSigning { .. } => "token_signing_error",
            Self::InvalidToken { .. } => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::CacheWrite { .. } => "cache_write_error",
            Self::EntryTooLarge { .. } => "entry_too_large",
            Self::KeyTooLarge { .. } => "key_too_large",
            Self::Storage { .. } => "storage_error",
            Self::Configuration { .. } => "configuration_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Message safe to hand to a client.
    ///
    /// Cryptographic and credential failures get a fixed text so that nothing about
    /// the stored user or the signing key leaks through the error body.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound { .. } | Self::PasswordMismatch => "not found".to_string(),
            Self::InvalidToken { .. } => "invalid token".to_string(),
            Self::ExpiredToken => "token has expired".to_string(),
            Self::Hashing { .. }
            | Self::TokenSigning { .. }
            | Self::Storage { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => "system error".to_string(),
            Self::Validation { message } | Self::Conflict { message } => message.clone(),
            Self::CacheWrite { .. } | Self::EntryTooLarge { .. } | Self::KeyTooLarge { .. } => {
                "token store is unavailable".to_string()
            }
        }
    }
}
