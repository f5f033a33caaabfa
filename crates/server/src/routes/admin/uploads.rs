//! Image uploads.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::services::uploads::save_image;
use crate::state::AppState;

/// Where the stored image can be fetched.
#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub url: String,
}

/// Store the multipart field named `file`.
///
/// # Errors
///
/// 400 for a missing field, a non-image or an empty file.
pub async fn upload(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Uploaded>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;

        let url = save_image(
            &state.config().upload_dir,
            content_type.as_deref(),
            file_name.as_deref(),
            &bytes,
        )
        .await?;

        tracing::info!(url = %url, admin_id = %admin.id, "Upload stored");
        return Ok((StatusCode::CREATED, Json(Uploaded { url })));
    }

    Err(AppError::BadRequest("Missing 'file' field".to_string()))
}
