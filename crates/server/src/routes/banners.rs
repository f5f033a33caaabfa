//! Home page banners.

use axum::extract::State;

use crate::db::BannerRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::HeroBanner;
use crate::state::AppState;

/// All banners, newest first.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<HeroBanner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list().await?))
}
