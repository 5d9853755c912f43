//! Authentication endpoints: the Yandex OAuth flow and token refresh.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Extension, Json,
};
use serde::Deserialize;

use super::ApiResult;
use crate::auth::create_access_token;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{NewUser, TokenResponse, User};
use crate::oauth::YandexUserInfo;
use crate::AppState;

/// Query parameters delivered to the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
}

/// GET /auth/yandex - Redirect the user to Yandex for authorization.
pub async fn yandex_auth_start(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.oauth.authorization_url())
}

/// Resolve a Yandex profile to a local account, creating it on first login.
///
/// A new account becomes a superuser only when its email matches the
/// configured superuser email; returning logins always get the stored
/// record back unchanged.
pub(crate) async fn provision_user(
    repo: &Repository,
    superuser_email: &str,
    user_info: &YandexUserInfo,
) -> Result<User, AppError> {
    let email = user_info.email()?;

    if let Some(user) = repo.get_user_by_yandex_id(&user_info.id).await? {
        return Ok(user);
    }

    let is_superuser = !superuser_email.is_empty() && email == superuser_email;
    let new_user = NewUser {
        yandex_id: user_info.id.clone(),
        email: email.to_string(),
        username: user_info.display_name.clone().unwrap_or_default(),
        is_superuser,
    };
    let user = repo.create_user(&new_user).await?;
    tracing::info!("Created user {} for yandex id {}", user.id, user.yandex_id);
    Ok(user)
}

/// GET /auth/yandex/callback - Complete the OAuth flow and issue a token.
pub async fn yandex_auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<TokenResponse> {
    let provider_token = state.oauth.exchange_code(&params.code).await?;
    let user_info = state.oauth.fetch_user_info(&provider_token).await?;

    let user = provision_user(&state.repo, &state.config.superuser_email, &user_info).await?;

    let token = create_access_token(
        &user.id,
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )?;

    Ok(Json(TokenResponse::bearer(token)))
}

/// POST /token/refresh - Issue a fresh token for the current user.
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<TokenResponse> {
    let token = create_access_token(
        &user.id,
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )?;

    Ok(Json(TokenResponse::bearer(token)))
}
