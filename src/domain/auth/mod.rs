//! Authentication domain
//!
//! Claims carried by access tokens and the identifiers used for refresh rotation.

mod claims;
mod token;

pub use claims::AccessClaims;
pub use token::{RefreshTokenId, TokenPair};
