//! Yandex OAuth client.
//!
//! Implements the authorization-code flow: building the authorization URL,
//! exchanging the callback code for a provider access token, and fetching
//! the user profile.

use reqwest::Url;
use serde::Deserialize;

use crate::config::Config;
use crate::errors::AppError;

const AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
const TOKEN_URL: &str = "https://oauth.yandex.ru/token";
const USER_INFO_URL: &str = "https://login.yandex.ru/info";
const SCOPE: &str = "login:email login:info";

/// User profile as reported by `login.yandex.ru/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct YandexUserInfo {
    pub id: String,
    #[serde(default)]
    pub default_email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl YandexUserInfo {
    /// The profile email. Absence is an error: accounts are keyed on email.
    pub fn email(&self) -> Result<&str, AppError> {
        self.default_email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::OAuth("Email not received from Yandex".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// Client for the Yandex OAuth endpoints.
#[derive(Clone)]
pub struct YandexOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl YandexOAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.yandex_client_id.clone(),
            client_secret: config.yandex_client_secret.clone(),
            redirect_uri: config.yandex_redirect_uri.clone(),
        }
    }

    /// Build the URL the user is redirected to for authorization.
    pub fn authorization_url(&self) -> String {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPE),
            ],
        )
        .expect("static authorize URL is valid");
        url.into()
    }

    /// Exchange an authorization code for a provider access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Yandex token exchange failed: {} {}", status, body);
            return Err(AppError::OAuth(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token: TokenExchangeResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the user profile for a provider access token.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<YandexUserInfo, AppError> {
        let response = self
            .http
            .get(USER_INFO_URL)
            .query(&[("format", "json")])
            .header("Authorization", format!("OAuth {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Yandex user info request failed: {}", status);
            return Err(AppError::OAuth(format!(
                "User info request failed with status {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}
