//! Post handlers. Reads are public (published only unless a credential
//! came through the gate); writes are gated.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use quill_core::content::{self, DEFAULT_PER_PAGE, DEFAULT_SEARCH_PER_PAGE};
use quill_core::models::content::{NewPost, Post, PostPage, PostQuery, PostStatus};
use uuid::Uuid;

use super::path_id;
use crate::AppState;
use crate::error::{ApiJson, ApiQuery, AppResult};
use crate::middleware::gate::MaybePrincipal;
use crate::models::{
    CreatePostRequest, PostListParams, SearchParams, SuccessResponse, UpdatePostRequest,
};

fn post_id(raw: &str) -> AppResult<Uuid> {
    path_id(raw, "文章不存在")
}

/// `GET /api/posts?page&perPage&status&category&tag`
pub async fn list_posts_handler(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    ApiQuery(params): ApiQuery<PostListParams>,
) -> AppResult<Json<PostPage>> {
    let query = PostQuery {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(DEFAULT_PER_PAGE),
        status: params.status.as_deref().and_then(PostStatus::parse),
        category_slug: params.category.filter(|s| !s.is_empty()),
        tag_slug: params.tag.filter(|s| !s.is_empty()),
        search: None,
    };
    let page = content::list_posts(&state.store, query, principal.is_authenticated()).await?;
    Ok(Json(page))
}

/// `GET /api/posts/search?q&page&perPage`
pub async fn search_posts_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<Json<PostPage>> {
    let page = content::search_posts(
        &state.store,
        &params.q,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_SEARCH_PER_PAGE),
    )
    .await?;
    Ok(Json(page))
}

/// `GET /api/posts/{id}`
pub async fn get_post_handler(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Path(id): Path<String>,
) -> AppResult<Json<Post>> {
    let post = content::get_post(&state.store, post_id(&id)?, principal.is_authenticated()).await?;
    Ok(Json(post))
}

/// `GET /api/posts/slug/{slug}`
pub async fn get_post_by_slug_handler(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Path(slug): Path<String>,
) -> AppResult<Json<Post>> {
    let post =
        content::get_post_by_slug(&state.store, &slug, principal.is_authenticated()).await?;
    Ok(Json(post))
}

/// `POST /api/posts`
pub async fn create_post_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let input = NewPost {
        slug: body.slug,
        title: body.title,
        content: body.content,
        excerpt: body.excerpt.unwrap_or_default(),
        summary: body.summary.unwrap_or_default(),
        faq: body.faq,
        featured_image: body.featured_image,
        status: body.status.unwrap_or(PostStatus::Draft),
        category_id: body.category_id,
        reading_time: body.reading_time,
        tag_ids: body.tag_ids,
    };
    let post = content::create_post(&state.store, input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `PUT /api/posts/{id}`
pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdatePostRequest>,
) -> AppResult<Json<Post>> {
    let post = content::update_post(&state.store, post_id(&id)?, body.into()).await?;
    Ok(Json(post))
}

/// `DELETE /api/posts/{id}`
pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    content::delete_post(&state.store, post_id(&id)?).await?;
    Ok(Json(SuccessResponse::ok()))
}
