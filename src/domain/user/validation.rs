//! User validation utilities

use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User ID cannot be empty")]
    EmptyId,

    #[error("User ID is not a valid UUID: '{0}'")]
    MalformedId(String),

    #[error("Phone number cannot be empty")]
    EmptyPhoneNumber,

    #[error("Phone number exceeds maximum length of {0} characters")]
    PhoneNumberTooLong(usize),

    #[error("Phone number contains invalid character: '{0}'. Only digits and a leading '+' are allowed")]
    InvalidPhoneNumberCharacter(char),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Password does not match repeated password")]
    PasswordConfirmationMismatch,

    #[error("Full name exceeds maximum length of {0} characters")]
    FullNameTooLong(usize),
}

const MAX_PHONE_NUMBER_LENGTH: usize = 20;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_FULL_NAME_LENGTH: usize = 100;

/// Validate a user ID
///
/// IDs are hyphenated UUIDs assigned at creation time.
pub fn validate_user_id(id: &str) -> Result<(), UserValidationError> {
    if id.is_empty() {
        return Err(UserValidationError::EmptyId);
    }

    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| UserValidationError::MalformedId(id.to_string()))
}

/// Validate a phone number
///
/// Rules:
/// - Cannot be empty
/// - Maximum 20 characters
/// - Digits only, with an optional leading '+'
pub fn validate_phone_number(phone_number: &str) -> Result<(), UserValidationError> {
    if phone_number.is_empty() {
        return Err(UserValidationError::EmptyPhoneNumber);
    }

    if phone_number.len() > MAX_PHONE_NUMBER_LENGTH {
        return Err(UserValidationError::PhoneNumberTooLong(MAX_PHONE_NUMBER_LENGTH));
    }

    let digits = phone_number.strip_prefix('+').unwrap_or(phone_number);

    if digits.is_empty() {
        return Err(UserValidationError::EmptyPhoneNumber);
    }

    for c in digits.chars() {
        if !c.is_ascii_digit() {
            return Err(UserValidationError::InvalidPhoneNumberCharacter(c));
        }
    }

    Ok(())
}

/// Validate a plaintext password
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Check that the password was typed the same way twice
pub fn validate_password_confirmation(
    password: &str,
    repeat_password: &str,
) -> Result<(), UserValidationError> {
    if password != repeat_password {
        return Err(UserValidationError::PasswordConfirmationMismatch);
    }

    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), UserValidationError> {
    if full_name.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(UserValidationError::FullNameTooLong(MAX_FULL_NAME_LENGTH));
    }

    Ok(())
}
