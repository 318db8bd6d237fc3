//! Password login, logout, first-run setup and current-user handlers.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use quill_core::auth::{jwt, login, setup};
use quill_core::models::auth::Credential;
use tracing::info;

use super::session_rejection;
use crate::AppState;
use crate::error::{ApiJson, AppError, AppResult};
use crate::models::{
    LoginRequest, LoginResponse, MeResponse, SessionUser, SetupRequest, SetupStatusResponse,
    SuccessResponse,
};
use crate::services::auth::session_from_jar;
use crate::services::cookies::{clear_session_cookie, session_cookie};

/// Issue a session for `credential` and attach it to the jar.
fn sign_in(
    state: &AppState,
    jar: CookieJar,
    credential: &Credential,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let token = jwt::issue_session(
        &credential.id.to_string(),
        credential.role,
        state.config.jwt_secret.as_bytes(),
    )?;
    let jar = jar.add(session_cookie(&token, state.config.secure_cookies));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: SessionUser::from(credential),
        }),
    ))
}

/// `POST /api/auth/login`: email + password, sets the session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let credential = login::authenticate(&state.store, &body.email, &body.password).await?;
    info!(credential_id = %credential.id, "password login");
    sign_in(&state, jar, &credential)
}

/// `POST /api/auth/logout`: clear the session cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    (
        jar.add(clear_session_cookie(state.config.secure_cookies)),
        Json(SuccessResponse::ok()),
    )
}

/// `GET /api/auth/setup`: whether the first admin still has to be created.
pub async fn setup_status_handler(State(state): State<AppState>) -> Json<SetupStatusResponse> {
    Json(SetupStatusResponse {
        need_setup: setup::needs_setup(&state.store).await,
    })
}

/// `POST /api/auth/setup`: create the first admin and sign them in.
pub async fn setup_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SetupRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let credential = setup::create_initial_admin(
        &state.store,
        &body.email,
        &body.password,
        body.name.as_deref(),
    )
    .await?;
    sign_in(&state, jar, &credential)
}

/// `GET /api/auth/me`: the signed-in credential, re-read from the store.
pub async fn me_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<MeResponse>> {
    let claims = session_from_jar(&jar, state.config.jwt_secret.as_bytes())
        .ok_or_else(AppError::unauthorized)?;
    let credential = login::active_credential(&state.store, &claims.sub)
        .await
        .map_err(session_rejection)?;
    Ok(Json(MeResponse::from(credential)))
}
