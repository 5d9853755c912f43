//! Audio File Service Backend
//!
//! A REST backend that authenticates users through Yandex OAuth, issues JWT
//! access tokens, and stores uploaded audio files with SQLite metadata.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod oauth;
mod storage;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use oauth::YandexOAuth;
use storage::AudioStorage;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub storage: Arc<AudioStorage>,
    pub oauth: Arc<YandexOAuth>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Audio File Service");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Audio files dir: {:?}", config.audio_files_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize audio content storage
    let storage = Arc::new(AudioStorage::open(&config.audio_files_dir).await?);

    // OAuth client
    let oauth = Arc::new(YandexOAuth::new(&config));

    // Create application state
    let state = AppState {
        repo,
        storage,
        oauth,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone state for the auth layer
    let auth_state = state.clone();

    // Routes requiring a valid bearer token
    let protected_routes = Router::new()
        // Users
        .route("/users/me", get(api::read_users_me))
        .route("/users/me", patch(api::update_users_me))
        .route("/users/{id}", get(api::read_user))
        .route("/users/{id}", delete(api::delete_user))
        // Audio files
        .route("/audio/upload", post(api::upload_audio))
        .route("/audio/files", get(api::list_audio_files))
        // Tokens
        .route("/token/refresh", post(api::refresh_token))
        // Apply JWT auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::jwt_auth_layer(auth_state.clone(), req, next)
        }));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/auth/yandex", get(api::yandex_auth_start))
        .route("/auth/yandex/callback", get(api::yandex_auth_callback));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint.
async fn root() -> Json<api::MessageResponse> {
    Json(api::MessageResponse::new("Welcome to Audio File Service"))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
