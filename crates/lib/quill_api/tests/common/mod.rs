//! Shared helpers for router-level tests: in-memory store, fixed config,
//! seeded accounts and a one-shot request driver.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use quill_api::config::{ApiConfig, GoogleOAuthConfig};
use quill_api::{AppState, router};
use quill_core::auth::jwt::issue_session;
use quill_core::models::auth::{Credential, NewCredential, Role};
use quill_core::store::Store;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-test-secret-test-secret!";
pub const AGENT_KEY: &str = "agent-key-for-tests";

pub fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        jwt_secret: SECRET.into(),
        agent_api_key: Some(AGENT_KEY.into()),
        site_url: "http://blog.test".into(),
        super_admin_email: Some("boss@example.com".into()),
        google: None,
        upload_dir: PathBuf::from("uploads-unused"),
        secure_cookies: false,
    }
}

/// Google settings pointing at a mock provider.
pub fn mock_google(base: &str) -> GoogleOAuthConfig {
    GoogleOAuthConfig {
        auth_url: format!("{base}/auth"),
        token_url: format!("{base}/token"),
        userinfo_url: format!("{base}/userinfo"),
        ..GoogleOAuthConfig::new("client-id", "client-secret", "http://blog.test")
    }
}

pub struct TestApp {
    pub store: Store,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ApiConfig) -> Self {
        let store = Store::in_memory();
        let router = router(AppState::new(store.clone(), config));
        Self { store, router }
    }

    /// Insert an account directly. No password; sign in via [`session_cookie`].
    pub async fn seed(&self, email: &str, role: Role, active: bool) -> Credential {
        self.store
            .create_credential(NewCredential {
                email: email.into(),
                name: email.split('@').next().unwrap_or_default().into(),
                password_hash: None,
                role,
                is_active: active,
                google_id: None,
                avatar: None,
            })
            .await
            .expect("seed credential")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let resp = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        TestResponse {
            status,
            headers,
            body: bytes.to_vec(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(request(Method::GET, uri).body(Body::empty()).unwrap())
            .await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `Set-Cookie` header lines for the named cookie.
    pub fn set_cookies(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| v.starts_with(&format!("{name}=")))
            .map(str::to_string)
            .collect()
    }

    /// Value of a cookie that was set (not cleared) by this response.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookies(name).into_iter().find_map(|line| {
            let value = line
                .split(';')
                .next()?
                .trim_start_matches(&format!("{name}="))
                .to_string();
            (!value.is_empty()).then_some(value)
        })
    }
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

/// Finish a builder with a JSON body.
pub fn with_json(builder: axum::http::request::Builder, body: &Value) -> Request<Body> {
    builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_body(method: Method, uri: &str, body: &Value) -> Request<Body> {
    with_json(request(method, uri), body)
}

/// `Cookie` header value carrying a fresh session for `credential`.
pub fn session_cookie(credential: &Credential) -> String {
    let token = issue_session(
        &credential.id.to_string(),
        credential.role,
        SECRET.as_bytes(),
    )
    .unwrap();
    format!("admin-session={token}")
}
