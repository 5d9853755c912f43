//! JWT-based authentication module.
//!
//! Access tokens are HS256-signed and carry the user id as the subject.
//! The middleware resolves the bearer token to a full user record and makes
//! it available to handlers through request extensions.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, ErrorResponse};
use crate::models::Claims;
use crate::AppState;

/// Create a signed access token for a user.
pub fn create_access_token(
    user_id: &str,
    secret: &str,
    expires_minutes: i64,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::minutes(expires_minutes)).timestamp(),
    };

    // A signing failure is a server fault, not a credential problem
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// Validate a token's signature and expiry, returning its claims.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
    Ok(data.claims)
}

/// Bearer-token authentication layer.
///
/// On success the resolved [`crate::models::User`] is inserted into the
/// request extensions.
pub async fn jwt_auth_layer(state: AppState, mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let Some(token) = token else {
        return unauthorized_response("Missing bearer token");
    };

    let claims = match decode_access_token(&token, &state.config.secret_key) {
        Ok(claims) => claims,
        Err(_) => return unauthorized_response("Invalid or expired token"),
    };

    let user = match state.repo.get_user(&claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized_response("Unknown user"),
        Err(e) => return e.into_response(),
    };

    if !user.is_active {
        return AppError::Forbidden("Inactive user".to_string()).into_response();
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse::new(&AppError::Unauthorized(message.to_string()));
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
