//! Request gate behaviour through the full router.

mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode, header};
use common::{AGENT_KEY, TestApp, json_body, request, session_cookie, with_json};
use quill_core::models::auth::Role;
use serde_json::json;

fn new_post(slug: &str) -> serde_json::Value {
    json!({ "title": "Hello", "slug": slug, "content": "Body text" })
}

#[tokio::test]
async fn public_reads_pass_without_credentials() {
    let app = TestApp::new();
    let resp = app.get("/api/posts").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["posts"], json!([]));

    assert_eq!(app.get("/api/categories").await.status, StatusCode::OK);
    assert_eq!(app.get("/api/tags").await.status, StatusCode::OK);
}

#[tokio::test]
async fn writes_without_credentials_get_401_json() {
    let app = TestApp::new();
    let resp = app
        .send(json_body(Method::POST, "/api/posts", &new_post("a")))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json(), json!({ "error": "未授權" }));

    let resp = app.get("/api/admin/settings").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json(), json!({ "error": "未授權" }));
}

#[tokio::test]
async fn agent_key_is_accepted_in_either_header() {
    let app = TestApp::new();

    let resp = app
        .send(with_json(
            request(Method::POST, "/api/posts").header("x-api-key", AGENT_KEY),
            &new_post("via-header"),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app
        .send(with_json(
            request(Method::POST, "/api/posts")
                .header(header::AUTHORIZATION, format!("Bearer {AGENT_KEY}")),
            &new_post("via-bearer"),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
}

#[tokio::test]
async fn wrong_agent_key_is_rejected() {
    let app = TestApp::new();
    let resp = app
        .send(with_json(
            request(Method::POST, "/api/posts").header("x-api-key", "not-the-key"),
            &new_post("nope"),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn console_redirects_to_login_without_session() {
    let app = TestApp::new();

    let resp = app.get("/admin").await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), Some("/admin/login"));

    let resp = app.get("/admin/posts/new").await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), Some("/admin/login"));

    let resp = app
        .send(
            request(Method::GET, "/admin")
                .header(header::COOKIE, "admin-session=garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.location(), Some("/admin/login"));
}

#[tokio::test]
async fn login_page_bounces_signed_in_users() {
    let app = TestApp::new();
    let admin = app.seed("admin@example.com", Role::Admin, true).await;

    let resp = app
        .send(
            request(Method::GET, "/admin/login")
                .header(header::COOKIE, session_cookie(&admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), Some("/admin"));

    let resp = app.get("/admin/login").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.text().contains("admin-root"));
}

#[tokio::test]
async fn setup_page_is_always_reachable() {
    let app = TestApp::new();
    assert_eq!(app.get("/admin/setup").await.status, StatusCode::OK);
}

#[tokio::test]
async fn console_renders_with_session() {
    let app = TestApp::new();
    let editor = app.seed("editor@example.com", Role::Editor, true).await;
    let resp = app
        .send(
            request(Method::GET, "/admin")
                .header(header::COOKIE, session_cookie(&editor))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(
        resp.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
}

#[tokio::test]
async fn session_cookie_unlocks_drafts_on_public_reads() {
    let app = TestApp::new();
    let editor = app.seed("editor@example.com", Role::Editor, true).await;
    let cookie = session_cookie(&editor);

    let created = app
        .send(with_json(
            request(Method::POST, "/api/posts").header(header::COOKIE, &cookie),
            &new_post("draft-one"),
        ))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["status"], "draft");

    let anonymous = app.get("/api/posts").await.json();
    assert_eq!(anonymous["total"], 0);

    let signed_in = app
        .send(
            request(Method::GET, "/api/posts")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .json();
    assert_eq!(signed_in["total"], 1);

    let resp = app.get("/api/posts/slug/draft-one").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_are_json_404() {
    let app = TestApp::new();
    let resp = app.get("/nope").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.json()["error"].is_string());
}
