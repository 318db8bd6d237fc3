//! Media upload and serving.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::UploadResponse;
use crate::services::uploads::{
    MAX_UPLOAD_BYTES, content_type_for, extension_for, generate_filename, resolve_served_path,
    store_upload,
};

const MISSING_FILE: &str = "缺少檔案，請在 form-data 中附加 file 欄位";
const TOO_LARGE: &str = "檔案大小超過 10MB 上限";

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(TOO_LARGE.into())
    } else {
        AppError::Validation(e.body_text())
    }
}

/// `POST /api/admin/upload`: multipart field `file`, images only.
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|_| AppError::Validation(MISSING_FILE.into()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let mime = field.content_type().unwrap_or_default().to_string();
        let ext = extension_for(&mime)
            .ok_or_else(|| AppError::Validation(format!("不支援的檔案類型：{mime}")))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(TOO_LARGE.into()));
        }

        let filename = generate_filename(ext);
        store_upload(&state.config.upload_dir, &filename, &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("writing upload: {e}")))?;
        info!(%filename, size = bytes.len(), "upload stored");

        return Ok(Json(UploadResponse {
            success: true,
            url: format!("{}/uploads/{filename}", state.config.site_url),
            filename,
        }));
    }

    Err(AppError::Validation(MISSING_FILE.into()))
}

/// `GET /uploads/{*path}`
pub async fn serve_upload_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let Some(file) = resolve_served_path(&state.config.upload_dir, &path) else {
        warn!(%path, "rejected upload path");
        return Err(AppError::Forbidden("Forbidden".into()));
    };
    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Not found".into()));
        }
        Err(e) => return Err(AppError::Internal(format!("reading upload: {e}"))),
    };
    Ok((
        [
            (CONTENT_TYPE, content_type_for(&path)),
            (CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    )
        .into_response())
}
