//! Infrastructure layer - Implementations of the domain traits

pub mod auth;
pub mod cache;
pub mod logging;
pub mod user;
