//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::auth::AuthService;

/// Application state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }
}
