use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::current_user::CurrentUser;
use crate::conversions::history::{list_history, HistoryEntry};
use crate::conversions::workflow::convert_and_store;
use crate::errors::AppError;
use crate::state::AppState;

/// Multipart field carrying the image bytes.
const UPLOAD_FIELD: &str = "image";

/// Container formats accepted for upload. Only the extension is checked
/// here; the converter rejects bytes that do not actually decode.
const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub storage_key: String,
    pub download_url: String,
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
}

/// POST /api/v1/conversions
///
/// Accepts a multipart upload with an `image` field, converts it to a PDF,
/// stores the result and returns the storage key plus a download URL.
pub async fn handle_convert(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    let mut upload: Option<(String, bytes::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        upload = Some((filename, data));
    }

    let (original_filename, data) =
        upload.ok_or_else(|| AppError::Validation(format!("Missing '{UPLOAD_FIELD}' field")))?;
    if !has_supported_extension(&original_filename) {
        return Err(AppError::Validation(format!(
            "Unsupported file type: expected one of {}",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let stored = convert_and_store(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        state.config.download_url_ttl(),
        &user.id,
        &original_filename,
        &data,
    )
    .await?;

    Ok(Json(ConvertResponse {
        storage_key: stored.record.pdf_storage_key,
        download_url: stored.download_url,
        original_filename: stored.record.original_filename,
        created_at: stored.record.created_at,
    }))
}

/// GET /api/v1/conversions
///
/// The caller's past conversions, newest first, with download URLs.
pub async fn handle_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let entries = list_history(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        state.config.download_url_ttl(),
        &user.id,
    )
    .await?;
    Ok(Json(entries))
}

fn has_supported_extension(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
