//! REST API module.
//!
//! Contains all route handlers. Handlers return plain JSON bodies and map
//! failures through [`crate::errors::AppError`].

mod audio;
mod auth;
mod users;

pub use audio::*;
pub use auth::*;
pub use users::*;

use serde::{Deserialize, Serialize};

/// Simple message body used by the root route and delete confirmations.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Handler result type: JSON body or mapped application error.
pub type ApiResult<T> = Result<axum::Json<T>, crate::errors::AppError>;
