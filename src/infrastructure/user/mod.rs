//! User infrastructure module
//!
//! Password hashing with Argon2 and an in-memory user store.

mod password;
mod repository;

pub use password::{Argon2Hasher, PasswordHashConfig, PasswordHasher};
pub use repository::InMemoryUserRepository;
