//! Hero banner administration.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use schoolmall_core::HeroBannerId;

use super::non_blank;
use crate::db::banners::BannerInput;
use crate::db::{BannerRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::models::HeroBanner;
use crate::services::uploads::remove_local_image;
use crate::state::AppState;

/// Banner body; `title` and `image` are required on create.
#[derive(Debug, Deserialize)]
pub struct BannerBody {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

fn banner_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Banner not found".to_string()),
        other => other.into(),
    }
}

/// All banners.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroBanner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list().await?))
}

/// One banner.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<HeroBanner>> {
    BannerRepository::new(state.pool())
        .get(HeroBannerId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Banner not found".to_string()))
}

/// Create a banner.
///
/// # Errors
///
/// 400 without a title or image.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<BannerBody>,
) -> Result<(StatusCode, Json<HeroBanner>)> {
    let title = non_blank(body.title)
        .ok_or_else(|| AppError::BadRequest("title is required".to_string()))?;
    let image = non_blank(body.image)
        .ok_or_else(|| AppError::BadRequest("image is required".to_string()))?;
    let subtitle = non_blank(body.subtitle);
    let description = non_blank(body.description);

    let banner = BannerRepository::new(state.pool())
        .create(&title, &image, subtitle.as_deref(), description.as_deref())
        .await?;

    tracing::info!(banner_id = %banner.id, admin_id = %admin.id, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

/// Update a banner; a replaced local image is deleted.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<BannerBody>,
) -> Result<Json<HeroBanner>> {
    let repo = BannerRepository::new(state.pool());
    let id = HeroBannerId::new(id);
    let previous = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Banner not found".to_string()))?;

    let banner = repo
        .update(
            id,
            &BannerInput {
                title: non_blank(body.title),
                subtitle: body.subtitle,
                description: body.description,
                image: non_blank(body.image),
            },
        )
        .await
        .map_err(banner_not_found)?;

    if previous.image != banner.image {
        remove_local_image(&state.config().upload_dir, &previous.image).await;
    }

    tracing::info!(banner_id = %banner.id, admin_id = %admin.id, "Banner updated");
    Ok(Json(banner))
}

/// Delete a banner and its local image.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = BannerRepository::new(state.pool());
    let id = HeroBannerId::new(id);
    let banner = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Banner not found".to_string()))?;

    repo.delete(id).await.map_err(banner_not_found)?;
    remove_local_image(&state.config().upload_dir, &banner.image).await;

    tracing::info!(banner_id = %id, admin_id = %admin.id, "Banner deleted");
    Ok(StatusCode::NO_CONTENT)
}
