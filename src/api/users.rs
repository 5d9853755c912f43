//! User API endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::{ApiResult, MessageResponse};
use crate::errors::AppError;
use crate::models::{UpdateUsernameParams, User, UserResponse};
use crate::AppState;

/// GET /users/me - The current user's profile.
pub async fn read_users_me(Extension(user): Extension<User>) -> ApiResult<UserResponse> {
    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /users/me - Update the current user's display name.
pub async fn update_users_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<UpdateUsernameParams>,
) -> ApiResult<UserResponse> {
    let updated = state.repo.update_username(&user.id, &params.username).await?;
    Ok(Json(UserResponse::from(&updated)))
}

/// GET /users/{id} - Any user's profile. Superuser only.
pub async fn read_user(
    State(state): State<AppState>,
    Extension(current): Extension<User>,
    Path(user_id): Path<String>,
) -> ApiResult<UserResponse> {
    if !current.is_superuser {
        return Err(AppError::Forbidden("Not enough permissions".to_string()));
    }

    let user = state
        .repo
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /users/{id} - Delete a user and their audio files. Superuser only.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<User>,
    Path(user_id): Path<String>,
) -> ApiResult<MessageResponse> {
    if !current.is_superuser {
        return Err(AppError::Forbidden("Not enough permissions".to_string()));
    }

    let orphaned = state.repo.delete_user(&user_id).await?;

    // Metadata is gone; content removal is best-effort
    for path in orphaned {
        state.storage.remove(std::path::Path::new(&path)).await;
    }

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
