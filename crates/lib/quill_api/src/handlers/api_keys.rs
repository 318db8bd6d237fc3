//! API key management handlers.

use axum::Json;
use axum::extract::{Path, State};
use quill_core::auth::api_keys;
use quill_core::uuid::parse_id;

use super::path_id;
use crate::AppState;
use crate::error::{ApiJson, AppResult};
use crate::models::{
    ApiKeyListResponse, ApiKeyView, CreateApiKeyRequest, CreateApiKeyResponse, SuccessResponse,
};
use crate::services::auth::Principal;

/// `GET /api/admin/api-keys`: newest first, without the keys themselves.
pub async fn list_api_keys_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiKeyListResponse>> {
    let keys = api_keys::list_api_keys(&state.store)
        .await?
        .into_iter()
        .map(ApiKeyView::from)
        .collect();
    Ok(Json(ApiKeyListResponse { keys }))
}

/// `POST /api/admin/api-keys`: the full key is in this response only.
pub async fn create_api_key_handler(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(body): ApiJson<CreateApiKeyRequest>,
) -> AppResult<Json<CreateApiKeyResponse>> {
    let created_by = principal.session().and_then(|claims| parse_id(&claims.sub));
    let (key, record) = api_keys::create_api_key(
        &state.store,
        &body.name,
        created_by,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok(Json(CreateApiKeyResponse {
        id: record.id,
        name: record.name,
        prefix: record.prefix,
        key,
    }))
}

/// `DELETE /api/admin/api-keys/{id}`: soft-disable.
pub async fn revoke_api_key_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let id = path_id(&id, "API Key 不存在")?;
    api_keys::revoke_api_key(&state.store, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
