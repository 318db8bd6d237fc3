//! Google OAuth authorization-code client.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use quill_core::auth::oauth::GoogleProfile;
use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::GoogleOAuthConfig;

/// Failures talking to the provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("bad provider URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Token endpoint response; only the access token is used.
#[derive(Debug, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
}

/// Random CSRF state: 32 bytes, URL-safe base64.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Provider consent URL for the given state.
pub fn authorization_url(config: &GoogleOAuthConfig, state: &str) -> Result<Url, OAuthError> {
    Ok(Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "select_account"),
        ],
    )?)
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &GoogleOAuthConfig,
    code: &str,
) -> Result<GoogleTokens, OAuthError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];
    let resp = http.post(&config.token_url).form(&params).send().await?;
    if !resp.status().is_success() {
        return Err(OAuthError::Status {
            endpoint: "token",
            status: resp.status().as_u16(),
        });
    }
    debug!("authorization code exchanged");
    Ok(resp.json::<GoogleTokens>().await?)
}

/// Fetch the signed-in user's profile.
pub async fn fetch_profile(
    http: &reqwest::Client,
    config: &GoogleOAuthConfig,
    access_token: &str,
) -> Result<GoogleProfile, OAuthError> {
    let resp = http
        .get(&config.userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(OAuthError::Status {
            endpoint: "userinfo",
            status: resp.status().as_u16(),
        });
    }
    Ok(resp.json::<GoogleProfile>().await?)
}
