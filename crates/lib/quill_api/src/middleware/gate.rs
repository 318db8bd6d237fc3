//! Request gate: path policy for the admin console and the write API.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::handlers::found;
use crate::services::auth::{Principal, resolve_principal, session_from_jar};

/// What the gate does with a request, decided from method and path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Pass through untouched.
    Allow,
    /// Login page: bounce already-signed-in users to the console.
    LoginPage,
    /// Console page: session cookie or redirect to login.
    ConsolePage,
    /// API call that needs a credential.
    RequireCredential,
    /// Public read: attach a principal if one verifies, never reject.
    PublicRead,
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// First matching rule wins.
pub fn classify(method: &Method, path: &str) -> Policy {
    if path == "/admin/setup" {
        return Policy::Allow;
    }
    if path == "/admin/login" {
        return Policy::LoginPage;
    }
    if under(path, "/admin") {
        return Policy::ConsolePage;
    }
    if under(path, "/api/admin") {
        return Policy::RequireCredential;
    }
    if under(path, "/api/posts") || under(path, "/api/categories") {
        return if method == Method::GET || method == Method::HEAD {
            Policy::PublicRead
        } else {
            Policy::RequireCredential
        };
    }
    Policy::Allow
}

/// Axum middleware applying [`classify`] to every request.
pub async fn gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let policy = classify(request.method(), request.uri().path());
    let secret = state.config.jwt_secret.as_bytes();

    match policy {
        Policy::Allow => {}
        Policy::LoginPage => {
            if session_from_jar(&jar, secret).is_some() {
                return found("/admin");
            }
        }
        Policy::ConsolePage => match session_from_jar(&jar, secret) {
            Some(claims) => {
                request.extensions_mut().insert(Principal::Session(claims));
            }
            None => return found("/admin/login"),
        },
        Policy::RequireCredential => {
            match resolve_principal(&state, &jar, request.headers()).await {
                Some(principal) => {
                    request.extensions_mut().insert(principal);
                }
                None => {
                    debug!(path = %request.uri().path(), "rejected unauthenticated request");
                    return AppError::unauthorized().into_response();
                }
            }
        }
        Policy::PublicRead => {
            if let Some(principal) = resolve_principal(&state, &jar, request.headers()).await {
                request.extensions_mut().insert(principal);
            }
        }
    }

    next.run(request).await
}

/// The principal attached by the gate, if any.
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

impl MaybePrincipal {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybePrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Principal>().cloned()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_paths_need_a_session() {
        assert_eq!(classify(&Method::GET, "/admin"), Policy::ConsolePage);
        assert_eq!(classify(&Method::GET, "/admin/posts/new"), Policy::ConsolePage);
        assert_eq!(classify(&Method::GET, "/admin/login"), Policy::LoginPage);
        assert_eq!(classify(&Method::POST, "/admin/setup"), Policy::Allow);
    }

    #[test]
    fn matching_respects_segment_boundaries() {
        assert_eq!(classify(&Method::GET, "/administrator"), Policy::Allow);
        assert_eq!(classify(&Method::POST, "/api/postsfeed"), Policy::Allow);
        assert_eq!(classify(&Method::GET, "/api/adminx"), Policy::Allow);
    }

    #[test]
    fn api_admin_always_needs_a_credential() {
        assert_eq!(classify(&Method::GET, "/api/admin"), Policy::RequireCredential);
        assert_eq!(
            classify(&Method::GET, "/api/admin/users"),
            Policy::RequireCredential
        );
    }

    #[test]
    fn content_reads_are_public_and_writes_gated() {
        assert_eq!(classify(&Method::GET, "/api/posts"), Policy::PublicRead);
        assert_eq!(classify(&Method::HEAD, "/api/posts/slug/a"), Policy::PublicRead);
        assert_eq!(classify(&Method::GET, "/api/categories"), Policy::PublicRead);
        assert_eq!(classify(&Method::POST, "/api/posts"), Policy::RequireCredential);
        assert_eq!(
            classify(&Method::DELETE, "/api/categories/1"),
            Policy::RequireCredential
        );
    }

    #[test]
    fn everything_else_passes() {
        assert_eq!(classify(&Method::POST, "/api/auth/login"), Policy::Allow);
        assert_eq!(classify(&Method::GET, "/api/tags"), Policy::Allow);
        assert_eq!(classify(&Method::GET, "/feed.xml"), Policy::Allow);
    }
}
