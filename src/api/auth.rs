//! Authentication API endpoints
//!
//! Login, refresh token rotation, and logout.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{CacheStats, TokenPair, User};

/// Routes mounted under `/api/auth`
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", put(refresh))
        .route("/logout", post(logout))
        .route("/cache/stats", get(cache_stats))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, tokens) = state
        .auth_service
        .login(&request.phone_number, &request.password)
        .await?;

    Ok(Json(LoginResponse { user, tokens }))
}

/// PUT /api/auth/refresh
///
/// The submitted refresh token is consumed; the response carries its replacement.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state
        .auth_service
        .rotate_refresh_token(&request.refresh_token)
        .await?;

    Ok(Json(tokens))
}

/// POST /api/auth/logout
///
/// Idempotent: unknown tokens are accepted.
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> StatusCode {
    state
        .auth_service
        .revoke_refresh_token(&request.refresh_token)
        .await;

    StatusCode::NO_CONTENT
}

/// GET /api/auth/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.auth_service.cache_stats().await)
}
