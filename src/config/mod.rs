//! Configuration module for the audio file service.
//!
//! All configuration is loaded from environment variables; optional values
//! have sensible defaults, credentials are required.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// HS256 signing secret for access tokens
    pub secret_key: String,
    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,
    /// Yandex OAuth application id
    pub yandex_client_id: String,
    /// Yandex OAuth application secret
    pub yandex_client_secret: String,
    /// OAuth callback URL registered with Yandex
    pub yandex_redirect_uri: String,
    /// Email granted superuser rights on first login (empty = nobody)
    pub superuser_email: String,
    /// Directory for uploaded audio content
    pub audio_files_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Error raised when a required environment variable is absent.
#[derive(Debug)]
pub struct MissingVar(pub &'static str);

impl std::fmt::Display for MissingVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "required environment variable {} is not set", self.0)
    }
}

impl std::error::Error for MissingVar {}

fn require(name: &'static str) -> Result<String, MissingVar> {
    env::var(name).map_err(|_| MissingVar(name))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, MissingVar> {
        dotenvy::dotenv().ok();

        let db_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let secret_key = require("SECRET_KEY")?;

        let access_token_expire_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let yandex_client_id = require("YANDEX_CLIENT_ID")?;
        let yandex_client_secret = require("YANDEX_CLIENT_SECRET")?;
        let yandex_redirect_uri = require("YANDEX_REDIRECT_URI")?;

        let superuser_email = env::var("SUPERUSER_EMAIL").unwrap_or_default();

        let audio_files_dir = env::var("AUDIO_FILES_DIR")
            .unwrap_or_else(|_| "audio_files".to_string())
            .into();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .expect("Invalid BIND_ADDR format");

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            db_path,
            secret_key,
            access_token_expire_minutes,
            yandex_client_id,
            yandex_client_secret,
            yandex_redirect_uri,
            superuser_email,
            audio_files_dir,
            bind_addr,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_required_vars() {
        env::set_var("SECRET_KEY", "test-secret");
        env::set_var("YANDEX_CLIENT_ID", "client-id");
        env::set_var("YANDEX_CLIENT_SECRET", "client-secret");
        env::set_var(
            "YANDEX_REDIRECT_URI",
            "http://localhost:8000/auth/yandex/callback",
        );
    }

    #[test]
    fn test_default_config() {
        set_required_vars();
        env::remove_var("DATABASE_PATH");
        env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
        env::remove_var("SUPERUSER_EMAIL");
        env::remove_var("AUDIO_FILES_DIR");
        env::remove_var("BIND_ADDR");
        env::remove_var("LOG_LEVEL");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/app.sqlite"));
        assert_eq!(config.access_token_expire_minutes, 30);
        assert_eq!(config.superuser_email, "");
        assert_eq!(config.audio_files_dir, PathBuf::from("audio_files"));
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.log_level, "info");
    }
}
