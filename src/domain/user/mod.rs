//! User domain
//!
//! This module provides domain types and traits for the user store,
//! including user entities, validation, and repository traits.

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserId, UserSnapshot, DEFAULT_ROLE};
pub use repository::UserRepository;
pub use validation::{
    validate_full_name, validate_password, validate_password_confirmation,
    validate_phone_number, validate_user_id, UserValidationError,
};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
