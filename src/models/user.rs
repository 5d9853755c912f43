//! User model populated via Yandex OAuth.

use serde::{Deserialize, Serialize};

/// A registered user. Accounts are created on first OAuth login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Identity at the OAuth provider
    pub yandex_id: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

/// User profile as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
        }
    }
}

/// Fields for creating a user from OAuth profile data.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub yandex_id: String,
    pub email: String,
    pub username: String,
    pub is_superuser: bool,
}

/// Query parameters for PATCH /users/me.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUsernameParams {
    pub username: String,
}
