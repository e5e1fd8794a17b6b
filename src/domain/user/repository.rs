//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Repository trait for the external user store
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their phone number (for login)
    async fn get_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, DomainError>;

    /// Insert a new user, returning the stored record
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Check if a phone number is already registered
    async fn phone_number_exists(&self, phone_number: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_phone_number(phone_number).await?.is_some())
    }
}
