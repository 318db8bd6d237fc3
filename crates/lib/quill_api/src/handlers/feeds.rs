//! RSS feed and sitemap.

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use quill_core::feed;

use crate::AppState;
use crate::error::AppResult;

fn xml(body: String) -> Response {
    (
        [
            (CONTENT_TYPE, "application/xml; charset=utf-8"),
            (CACHE_CONTROL, "public, max-age=3600"),
        ],
        body,
    )
        .into_response()
}

/// `GET /feed.xml`
pub async fn rss_handler(State(state): State<AppState>) -> AppResult<Response> {
    Ok(xml(feed::build_rss(&state.store, &state.config.site_url).await?))
}

/// `GET /sitemap.xml`
pub async fn sitemap_handler(State(state): State<AppState>) -> AppResult<Response> {
    Ok(xml(
        feed::build_sitemap(&state.store, &state.config.site_url).await?,
    ))
}
