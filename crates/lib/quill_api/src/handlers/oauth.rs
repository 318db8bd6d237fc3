//! Google sign-in: redirect to the provider and handle its callback.
//!
//! The callback always answers with a redirect. Failures land on the login
//! page with an `error` tag; the state cookie is cleared either way.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use quill_core::auth::{AuthError, jwt, oauth::link_google_account};
use quill_core::store::StoreError;
use serde::Deserialize;
use tracing::{info, warn};

use super::found;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::cookies::{
    OAUTH_STATE_COOKIE, clear_oauth_state_cookie, oauth_state_cookie, session_cookie,
};
use crate::services::oauth;

const LOGIN_PAGE: &str = "/admin/login";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /api/auth/google`: set the state cookie and go to the consent page.
pub async fn google_start_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    let google = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google 登入尚未設定".into()))?;
    let csrf = oauth::generate_state();
    let url = oauth::authorization_url(google, &csrf)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let jar = jar.add(oauth_state_cookie(&csrf, state.config.secure_cookies));
    Ok((jar, found(url.as_str())).into_response())
}

/// `GET /api/auth/google/callback`
pub async fn google_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let secure = state.config.secure_cookies;
    let stored = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(clear_oauth_state_cookie(secure));

    match complete_sign_in(&state, params, stored.as_deref()).await {
        Ok(token) => (jar.add(session_cookie(&token, secure)), found("/admin")).into_response(),
        Err(tag) => (jar, found(&format!("{LOGIN_PAGE}?error={tag}"))).into_response(),
    }
}

/// Run the callback checks in order; `Err` carries the error tag.
async fn complete_sign_in(
    state: &AppState,
    params: CallbackParams,
    stored_state: Option<&str>,
) -> Result<String, &'static str> {
    if params.error.is_some() {
        return Err("google_denied");
    }
    match (params.state.as_deref(), stored_state) {
        (Some(presented), Some(stored)) if !presented.is_empty() && presented == stored => {}
        _ => return Err("invalid_state"),
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err("no_code");
    };
    let Some(google) = state.config.google.as_ref() else {
        return Err("oauth_failed");
    };

    let tokens = oauth::exchange_code(&state.http, google, &code)
        .await
        .map_err(|e| {
            warn!(error = %e, "Google code exchange failed");
            "oauth_failed"
        })?;
    let profile = oauth::fetch_profile(&state.http, google, &tokens.access_token)
        .await
        .map_err(|e| {
            warn!(error = %e, "Google userinfo failed");
            "oauth_failed"
        })?;

    let credential = link_google_account(
        &state.store,
        &profile,
        state.config.super_admin_email.as_deref(),
    )
    .await
    .map_err(|e| match e {
        AuthError::Store(StoreError::Unavailable(_)) => "db_unavailable",
        other => {
            warn!(error = %other, "linking Google account failed");
            "oauth_failed"
        }
    })?;

    if !credential.is_active {
        info!(credential_id = %credential.id, "Google login pending approval");
        return Err("pending_approval");
    }

    info!(credential_id = %credential.id, "Google login");
    jwt::issue_session(
        &credential.id.to_string(),
        credential.role,
        state.config.jwt_secret.as_bytes(),
    )
    .map_err(|_| "oauth_failed")
}
