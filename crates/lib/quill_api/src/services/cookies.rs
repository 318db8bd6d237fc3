//! Cookie service: build and clear the httpOnly session and OAuth state
//! cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use quill_core::auth::jwt::SESSION_LIFETIME_SECS;
use time::Duration;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "admin-session";
/// Cookie carrying the OAuth CSRF state.
pub const OAUTH_STATE_COOKIE: &str = "google_oauth_state";
/// Lifetime of the OAuth state cookie.
pub const OAUTH_STATE_MAX_AGE_SECS: i64 = 300;

fn build(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Session cookie (7 days).
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(
        SESSION_COOKIE,
        token.to_string(),
        Duration::seconds(SESSION_LIFETIME_SECS),
        secure,
    )
}

/// Expired session cookie, to log out.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    build(SESSION_COOKIE, String::new(), Duration::ZERO, secure)
}

/// OAuth state cookie (5 minutes).
pub fn oauth_state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    build(
        OAUTH_STATE_COOKIE,
        state.to_string(),
        Duration::seconds(OAUTH_STATE_MAX_AGE_SECS),
        secure,
    )
}

pub fn clear_oauth_state_cookie(secure: bool) -> Cookie<'static> {
    build(OAUTH_STATE_COOKIE, String::new(), Duration::ZERO, secure)
}
