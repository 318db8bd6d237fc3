//! Site settings handlers.

use axum::Json;
use axum::extract::State;
use quill_core::content;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::{ApiJson, ApiQuery, AppResult};
use crate::models::{PutSettingRequest, SettingParams, SuccessResponse};

/// `GET /api/admin/settings` → `{settings}`; `?key=` → `{value}`.
pub async fn get_settings_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SettingParams>,
) -> AppResult<Json<Value>> {
    match params.key.filter(|k| !k.is_empty()) {
        Some(key) => {
            let value = content::get_setting(&state.store, &key).await?;
            Ok(Json(json!({ "value": value })))
        }
        None => {
            let settings = content::list_settings(&state.store).await?;
            Ok(Json(json!({ "settings": settings })))
        }
    }
}

/// `PUT /api/admin/settings`: an empty or null value deletes the key.
pub async fn put_setting_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PutSettingRequest>,
) -> AppResult<Json<SuccessResponse>> {
    content::put_setting(&state.store, &body.key, body.value.as_deref()).await?;
    Ok(Json(SuccessResponse::ok()))
}
