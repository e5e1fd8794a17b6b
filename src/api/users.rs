//! User registration and lookup endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::User;
use crate::infrastructure::auth::CreateUserRequest;

/// Routes mounted under `/api/users`
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/{id}", get(get_user))
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub id: String,
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.auth_service.create_user(request).await?;
    let location = format!("/api/users/{}", id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreateUserResponse {
            id: id.as_str().to_string(),
        }),
    ))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state.auth_service.get_user(&id).await?;
    Ok(Json(user))
}
