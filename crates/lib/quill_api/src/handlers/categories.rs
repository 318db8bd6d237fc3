//! Category handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use quill_core::content;
use quill_core::models::content::{Category, NewCategory};

use super::path_id;
use crate::AppState;
use crate::error::{ApiJson, AppResult};
use crate::models::{CreateCategoryRequest, SuccessResponse, UpdateCategoryRequest};

const CATEGORY_NOT_FOUND: &str = "分類不存在";

/// `GET /api/categories`: plain array, ordered by name.
pub async fn list_categories_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(content::list_categories(&state.store).await?))
}

/// `POST /api/categories`
pub async fn create_category_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = content::create_category(
        &state.store,
        NewCategory {
            name: body.name,
            slug: body.slug,
            description: body.description.unwrap_or_default(),
            icon: body.icon,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}`
pub async fn update_category_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    let id = path_id(&id, CATEGORY_NOT_FOUND)?;
    Ok(Json(content::update_category(&state.store, id, body.into()).await?))
}

/// `DELETE /api/categories/{id}`: posts in it become uncategorized.
pub async fn delete_category_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let id = path_id(&id, CATEGORY_NOT_FOUND)?;
    content::delete_category(&state.store, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
