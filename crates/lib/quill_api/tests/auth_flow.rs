//! Setup, password login, logout and `/api/auth/me`.

mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode, header};
use common::{TestApp, json_body, request, session_cookie};
use quill_core::auth::password::hash_password;
use quill_core::models::auth::{NewCredential, Role};
use serde_json::json;

const PASSWORD: &str = "correct horse";

#[tokio::test]
async fn first_setup_signs_in_and_closes_setup() {
    let app = TestApp::new();

    let status = app.get("/api/auth/setup").await;
    assert_eq!(status.json(), json!({ "needSetup": true }));

    let resp = app
        .send(json_body(
            Method::POST,
            "/api/auth/setup",
            &json!({ "email": "owner@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["name"], "管理員");
    let token = resp.cookie_value("admin-session").expect("session cookie");
    let line = &resp.set_cookies("admin-session")[0];
    assert!(line.contains("HttpOnly"));
    assert!(line.contains("SameSite=Lax"));
    assert!(line.contains("Max-Age=604800"));

    let me = app
        .send(
            request(Method::GET, "/api/auth/me")
                .header(header::COOKIE, format!("admin-session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["email"], "owner@example.com");

    assert_eq!(
        app.get("/api/auth/setup").await.json(),
        json!({ "needSetup": false })
    );

    let again = app
        .send(json_body(
            Method::POST,
            "/api/auth/setup",
            &json!({ "email": "second@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(again.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn setup_validates_input() {
    let app = TestApp::new();
    let resp = app
        .send(json_body(
            Method::POST,
            "/api/auth/setup",
            &json!({ "email": "owner@example.com", "password": "short" }),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .send(json_body(Method::POST, "/api/auth/setup", &json!({})))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "請填寫 Email 和密碼");
}

async fn app_with_password_user(active: bool) -> TestApp {
    let app = TestApp::new();
    app.store
        .create_credential(NewCredential {
            email: "writer@example.com".into(),
            name: "Writer".into(),
            password_hash: Some(hash_password(PASSWORD).unwrap()),
            role: Role::Editor,
            is_active: active,
            google_id: None,
            avatar: None,
        })
        .await
        .unwrap();
    app
}

#[tokio::test]
async fn login_with_correct_password_sets_cookie() {
    let app = app_with_password_user(true).await;
    let resp = app
        .send(json_body(
            Method::POST,
            "/api/auth/login",
            &json!({ "email": "writer@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["user"]["email"], "writer@example.com");
    assert!(resp.cookie_value("admin-session").is_some());
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = app_with_password_user(true).await;
    let resp = app
        .send(json_body(
            Method::POST,
            "/api/auth/login",
            &json!({ "email": "writer@example.com", "password": "wrong password" }),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json(), json!({ "error": "帳號或密碼錯誤" }));
    assert!(resp.cookie_value("admin-session").is_none());

    let unknown = app
        .send(json_body(
            Method::POST,
            "/api/auth/login",
            &json!({ "email": "ghost@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(unknown.json(), json!({ "error": "帳號或密碼錯誤" }));
}

#[tokio::test]
async fn login_edge_cases() {
    let app = app_with_password_user(false).await;
    let inactive = app
        .send(json_body(
            Method::POST,
            "/api/auth/login",
            &json!({ "email": "writer@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(inactive.status, StatusCode::FORBIDDEN);
    assert_eq!(inactive.json()["error"], "此帳號已被停用");

    let missing = app
        .send(json_body(Method::POST, "/api/auth/login", &json!({ "email": "" })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json()["error"], "請輸入帳號和密碼");

    app.seed("google@example.com", Role::Editor, true).await;
    let google_only = app
        .send(json_body(
            Method::POST,
            "/api/auth/login",
            &json!({ "email": "google@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(google_only.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_400_json_error() {
    let app = TestApp::new();
    let resp = app
        .send(
            request(Method::POST, "/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"].is_string());
}

#[tokio::test]
async fn me_requires_an_active_account() {
    let app = TestApp::new();
    assert_eq!(app.get("/api/auth/me").await.status, StatusCode::UNAUTHORIZED);

    let disabled = app.seed("off@example.com", Role::Editor, false).await;
    let resp = app
        .send(
            request(Method::GET, "/api/auth/me")
                .header(header::COOKIE, session_cookie(&disabled))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json(), json!({ "error": "未授權" }));
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = TestApp::new();
    let resp = app
        .send(
            request(Method::POST, "/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let lines = resp.set_cookies("admin-session");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Max-Age=0"));
    assert!(resp.cookie_value("admin-session").is_none());
}
