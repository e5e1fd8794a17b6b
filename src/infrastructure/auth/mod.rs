//! Authentication infrastructure module
//!
//! Access token signing plus the service that issues and rotates token pairs.

mod jwt;
mod service;

pub use jwt::{
    JwtConfig, JwtService, TokenSigner, DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_AUDIENCE,
    MAX_ACCESS_TOKEN_TTL_MINUTES,
};
pub use service::{AuthService, AuthServiceConfig, CreateUserRequest};

#[cfg(test)]
pub use jwt::mock::MockTokenSigner;
