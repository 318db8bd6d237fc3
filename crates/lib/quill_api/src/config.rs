//! API server configuration.

use std::path::PathBuf;

use quill_core::auth::jwt::resolve_jwt_secret_with;
use thiserror::Error;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Configuration errors. Any of these aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Secret(String),
}

/// Google OAuth client settings.
#[derive(Clone, Debug)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute URL of `/api/auth/google/callback` on this site.
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    /// Settings pointing at Google's production endpoints.
    pub fn new(client_id: &str, client_secret: &str, site_url: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: format!(
                "{}/api/auth/google/callback",
                site_url.trim_end_matches('/')
            ),
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            userinfo_url: GOOGLE_USERINFO_URL.into(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Shared key accepted from automation agents.
    pub agent_api_key: Option<String>,
    /// Public base URL, no trailing slash.
    pub site_url: String,
    /// Email that becomes an active admin on first Google login.
    pub super_admin_email: Option<String>,
    /// `None` when Google login is not configured.
    pub google: Option<GoogleOAuthConfig>,
    /// Directory uploaded media is written to and served from.
    pub upload_dir: PathBuf,
    /// Mark cookies `Secure` (production).
    pub secure_cookies: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                | Default                            |
    /// |-------------------------|------------------------------------|
    /// | `BIND_ADDR`             | `127.0.0.1:3000`                   |
    /// | `DATABASE_URL`          | `postgres://localhost:5432/quill`  |
    /// | `JWT_SECRET` / `AUTH_SECRET` | required, >= 32 bytes         |
    /// | `AGENT_API_KEY`         | unset                              |
    /// | `SITE_URL`              | `http://localhost:3000`            |
    /// | `SUPER_ADMIN_EMAIL`     | unset                              |
    /// | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` | unset          |
    /// | `UPLOAD_DIR`            | `./uploads`                        |
    /// | `APP_ENV`               | `development`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret =
            resolve_jwt_secret_with(&lookup).map_err(|e| ConfigError::Secret(e.to_string()))?;
        let site_url = non_empty("SITE_URL")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();
        let google = match (non_empty("GOOGLE_CLIENT_ID"), non_empty("GOOGLE_CLIENT_SECRET")) {
            (Some(id), Some(secret)) => Some(GoogleOAuthConfig::new(&id, &secret, &site_url)),
            _ => None,
        };

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".into()),
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/quill".into()),
            jwt_secret,
            agent_api_key: non_empty("AGENT_API_KEY"),
            site_url,
            super_admin_email: non_empty("SUPER_ADMIN_EMAIL"),
            google,
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            secure_cookies: non_empty("APP_ENV").as_deref() == Some("production"),
        })
    }
}
