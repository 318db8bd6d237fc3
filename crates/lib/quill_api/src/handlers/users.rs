//! Account administration. Only sessions whose stored role is admin get in.

use axum::Json;
use axum::extract::{Path, State};
use quill_core::auth::login::active_credential;
use quill_core::models::auth::{Credential, CredentialUpdate, Role};
use quill_core::store::StoreError;
use tracing::info;

use super::{path_id, session_rejection};
use crate::AppState;
use crate::error::{ApiJson, AppError, AppResult};
use crate::models::{UpdateUserRequest, UserListResponse, UserResponse, UserView};
use crate::services::auth::Principal;

const USER_NOT_FOUND: &str = "找不到此用戶";

/// Re-read the caller's credential and require the admin role.
async fn require_admin(state: &AppState, principal: &Principal) -> AppResult<Credential> {
    let claims = principal.session().ok_or_else(AppError::unauthorized)?;
    let current = active_credential(&state.store, &claims.sub)
        .await
        .map_err(session_rejection)?;
    if !current.is_admin() {
        return Err(AppError::Forbidden("需要管理員權限".into()));
    }
    Ok(current)
}

/// `GET /api/admin/users`
pub async fn list_users_handler(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<UserListResponse>> {
    require_admin(&state, &principal).await?;
    let users = state
        .store
        .list_credentials()
        .await?
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(Json(UserListResponse { users }))
}

/// `PATCH /api/admin/users/{id}`: toggle `isActive` or change `role`.
pub async fn update_user_handler(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let current = require_admin(&state, &principal).await?;
    let target = path_id(&id, USER_NOT_FOUND)?;
    if target == current.id {
        return Err(AppError::Validation("不能修改自己的帳號".into()));
    }

    let update = CredentialUpdate {
        is_active: body.is_active.and_then(|v| v.as_bool()),
        role: body.role.as_ref().and_then(|v| v.as_str()).and_then(Role::parse),
        ..Default::default()
    };
    if update.is_empty() {
        return Err(AppError::Validation("無有效欄位".into()));
    }

    let user = state
        .store
        .update_credential(target, &update)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => AppError::NotFound(USER_NOT_FOUND.into()),
            other => other.into(),
        })?;
    info!(
        admin_id = %current.id,
        credential_id = %user.id,
        role = user.role.as_str(),
        active = user.is_active,
        "credential updated"
    );
    Ok(Json(UserResponse {
        user: UserView::from(user),
    }))
}
