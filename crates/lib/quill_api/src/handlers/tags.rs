//! Tag handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use quill_core::content;
use quill_core::models::content::{NewTag, Tag};

use crate::AppState;
use crate::error::{ApiJson, AppResult};
use crate::models::CreateTagRequest;

/// `GET /api/tags`
pub async fn list_tags_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(content::list_tags(&state.store).await?))
}

/// `POST /api/admin/tags`
pub async fn create_tag_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTagRequest>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    let tag = content::create_tag(
        &state.store,
        NewTag {
            name: body.name,
            slug: body.slug,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}
