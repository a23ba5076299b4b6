//! Keycloak user administration handlers
//!
//! Create always answers 201 with a fixed `Location`, also when the user
//! already exists or Keycloak refuses it. The body carries the outcome.

use crate::domain::UserDto;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use tracing::info;

/// Base path of the user administration routes
pub const USER_ROUTES_PREFIX: &str = "/keycloak/user";

/// Fixed `Location` returned by create, not the created resource
pub const CREATE_LOCATION: &str = "/keycloak/user/create";

/// List all users of the realm
pub async fn find_all(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.find_all_users().await?;
    Ok(Json(users))
}

/// Search users by exact username
pub async fn search(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let users = state.user_service.search_user_by_username(&username).await?;
    Ok(Json(users))
}

/// Create user
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(dto): Json<UserDto>,
) -> Result<impl IntoResponse> {
    info!(caller = %caller.display_name(), username = %dto.username, "Create user requested");
    let outcome = state.user_service.create_user(dto).await?;
    Ok((
        StatusCode::CREATED,
        [(LOCATION, CREATE_LOCATION)],
        outcome.message(),
    ))
}

/// Update user (full overwrite, password included)
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(dto): Json<UserDto>,
) -> Result<impl IntoResponse> {
    info!(caller = %caller.display_name(), user_id = %user_id, "Update user requested");
    state.user_service.update_user(&user_id, dto).await?;
    Ok("User updated Successfully")
}

/// Delete user
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    info!(caller = %caller.display_name(), user_id = %user_id, "Delete user requested");
    state.user_service.delete_user(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
