//! Credential resolution shared by the gate and the auth handlers.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::CookieJar;
use quill_core::auth::api_keys::{matches_static_key, validate_api_key};
use quill_core::auth::jwt::verify_session;
use quill_core::models::auth::{ApiKeyRecord, SessionClaims};
use tracing::warn;

use super::cookies::SESSION_COOKIE;
use crate::AppState;

/// Header carrying an API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Who is behind a request. Inserted into request extensions by the gate.
#[derive(Debug, Clone)]
pub enum Principal {
    /// Browser session from the `admin-session` cookie.
    Session(SessionClaims),
    /// The shared `AGENT_API_KEY`.
    AgentKey,
    /// An issued, active API key.
    ApiKey(ApiKeyRecord),
}

impl Principal {
    /// Session claims, if this principal is a logged-in user.
    pub fn session(&self) -> Option<&SessionClaims> {
        match self {
            Principal::Session(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Verify the session cookie, if any.
pub fn session_from_jar(jar: &CookieJar, secret: &[u8]) -> Option<SessionClaims> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| verify_session(cookie.value(), secret))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    header_value(headers, AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Accept a header value as the agent key or an issued key.
async fn key_principal(state: &AppState, presented: &str) -> Option<Principal> {
    if matches_static_key(presented, state.config.agent_api_key.as_deref()) {
        return Some(Principal::AgentKey);
    }
    match validate_api_key(&state.store, presented, state.config.jwt_secret.as_bytes()).await {
        Ok(record) => record.map(Principal::ApiKey),
        Err(e) => {
            warn!(error = %e, "API key lookup failed");
            None
        }
    }
}

/// Resolve the caller: session cookie, then `x-api-key`, then
/// `Authorization: Bearer`. The first form that verifies wins.
pub async fn resolve_principal(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Option<Principal> {
    if let Some(claims) = session_from_jar(jar, state.config.jwt_secret.as_bytes()) {
        return Some(Principal::Session(claims));
    }
    if let Some(key) = header_value(headers, API_KEY_HEADER)
        && let Some(principal) = key_principal(state, key).await
    {
        return Some(principal);
    }
    if let Some(token) = bearer(headers) {
        return key_principal(state, token).await;
    }
    None
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer(&headers), None);
    }
}
