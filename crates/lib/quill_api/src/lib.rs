//! # quill_api
//!
//! HTTP API library for Quill: the axum router, the request gate and the
//! handlers behind it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use quill_core::store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{
    admin, api_keys, auth, categories, feeds, oauth, posts, settings, tags, uploads, users,
};
use crate::services::uploads::MAX_UPLOAD_BYTES;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend.
    pub store: Store,
    /// API configuration.
    pub config: ApiConfig,
    /// Outbound HTTP client (Google OAuth).
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(store: Store, config: ApiConfig) -> Self {
        Self {
            store,
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// Builds the Axum router with all routes, the gate and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route(
            "/api/auth/setup",
            get(auth::setup_status_handler).post(auth::setup_handler),
        )
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/auth/google", get(oauth::google_start_handler))
        .route(
            "/api/auth/google/callback",
            get(oauth::google_callback_handler),
        );

    let admin_routes = Router::new()
        .route("/api/admin/users", get(users::list_users_handler))
        .route("/api/admin/users/{id}", patch(users::update_user_handler))
        .route(
            "/api/admin/api-keys",
            get(api_keys::list_api_keys_handler).post(api_keys::create_api_key_handler),
        )
        .route(
            "/api/admin/api-keys/{id}",
            delete(api_keys::revoke_api_key_handler),
        )
        .route(
            "/api/admin/settings",
            get(settings::get_settings_handler).put(settings::put_setting_handler),
        )
        .route(
            "/api/admin/upload",
            post(uploads::upload_handler)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024)),
        )
        .route("/api/admin/tags", post(tags::create_tag_handler));

    let content_routes = Router::new()
        .route(
            "/api/posts",
            get(posts::list_posts_handler).post(posts::create_post_handler),
        )
        .route("/api/posts/search", get(posts::search_posts_handler))
        .route("/api/posts/slug/{slug}", get(posts::get_post_by_slug_handler))
        .route(
            "/api/posts/{id}",
            get(posts::get_post_handler)
                .put(posts::update_post_handler)
                .delete(posts::delete_post_handler),
        )
        .route(
            "/api/categories",
            get(categories::list_categories_handler).post(categories::create_category_handler),
        )
        .route(
            "/api/categories/{id}",
            put(categories::update_category_handler).delete(categories::delete_category_handler),
        )
        .route("/api/tags", get(tags::list_tags_handler));

    let site_routes = Router::new()
        .route("/feed.xml", get(feeds::rss_handler))
        .route("/sitemap.xml", get(feeds::sitemap_handler))
        .route("/uploads/{*path}", get(uploads::serve_upload_handler))
        .route("/admin", get(admin::console_handler))
        .route("/admin/{*path}", get(admin::console_handler));

    Router::new()
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(content_routes)
        .merge(site_routes)
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::gate::gate,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
