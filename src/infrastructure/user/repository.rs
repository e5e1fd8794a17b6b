//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct UserTable {
    users: HashMap<String, User>,
    /// phone number -> user ID
    phone_index: HashMap<String, String>,
}

/// In-memory implementation of UserRepository
///
/// Stands in for the external user store; phone numbers are unique.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    ///
    /// Later users with a duplicate phone number replace earlier ones.
    pub fn with_users(users: Vec<User>) -> Self {
        let mut table = UserTable::default();

        for user in users {
            let id = user.id().as_str().to_string();
            table
                .phone_index
                .insert(user.phone_number().to_string(), id.clone());
            table.users.insert(id, user);
        }

        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.table.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;
        Ok(table.users.get(id.as_str()).cloned())
    }

    async fn get_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .phone_index
            .get(phone_number)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        let id = user.id().as_str().to_string();
        let phone_number = user.phone_number().to_string();

        if table.users.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                id
            )));
        }

        if table.phone_index.contains_key(&phone_number) {
            return Err(DomainError::conflict(
                "Phone number is already registered",
            ));
        }

        table.phone_index.insert(phone_number, id.clone());
        table.users.insert(id, user.clone());

        Ok(user)
    }
}
