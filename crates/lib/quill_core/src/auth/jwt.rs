//! JWT session and API-key token generation and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use crate::models::auth::{ApiKeyClaims, Role, SessionClaims};

/// Issuer tag stamped into every token Quill signs.
pub const ISSUER: &str = "quill";

/// Session lifetime: 7 days.
pub const SESSION_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Minimum accepted signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// `kind` claim carried by issued API keys.
const API_KEY_KIND: &str = "api_key";

/// Generate a signed session token (HS256, 7 day expiry).
pub fn issue_session(credential_id: &str, role: Role, secret: &[u8]) -> Result<String, AuthError> {
    issue_session_at(credential_id, role, secret, Utc::now())
}

/// Generate a session token as if issued at `now`.
pub fn issue_session_at(
    credential_id: &str,
    role: Role,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = SessionClaims {
        sub: credential_id.to_string(),
        role,
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(SESSION_LIFETIME_SECS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a session token, returning the claims only if signature, issuer
/// and expiry all check out.
pub fn verify_session(token: &str, secret: &[u8]) -> Option<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = true;
    validation.leeway = 0;
    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Generate a signed, non-expiring API key token for a key record.
pub fn issue_api_key_token(key_id: &str, name: &str, secret: &[u8]) -> Result<String, AuthError> {
    let claims = ApiKeyClaims {
        sub: key_id.to_string(),
        name: name.to_string(),
        kind: API_KEY_KIND.to_string(),
        iss: ISSUER.to_string(),
        iat: Utc::now().timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify an API key token's signature, issuer and kind.
///
/// Says nothing about revocation; callers must check the stored record.
pub fn verify_api_key_token(token: &str, secret: &[u8]) -> Option<ApiKeyClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["iss", "sub"]);
    validation.validate_exp = false;
    decode::<ApiKeyClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .ok()
        .map(|data| data.claims)
        .filter(|claims| claims.kind == API_KEY_KIND)
}

/// Resolve the signing secret: env var `JWT_SECRET` → `AUTH_SECRET`.
///
/// There is no fallback; a missing or short secret is a startup error.
pub fn resolve_jwt_secret() -> Result<String, AuthError> {
    resolve_jwt_secret_with(|name| std::env::var(name).ok())
}

/// Resolve the signing secret through an arbitrary variable lookup.
pub fn resolve_jwt_secret_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, AuthError> {
    let secret = ["JWT_SECRET", "AUTH_SECRET"]
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| AuthError::Config("JWT_SECRET is not set".into()))?;

    if secret.len() < MIN_SECRET_LEN {
        return Err(AuthError::Config(format!(
            "JWT_SECRET must be at least {MIN_SECRET_LEN} bytes"
        )));
    }
    Ok(secret)
}
