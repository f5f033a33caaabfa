//! Delivery zones and fees.

use axum::extract::State;

use schoolmall_core::DeliveryRouteId;

use crate::db::DeliveryRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::models::{DeliveryRoute, DeliveryStop};
use crate::state::AppState;

/// Every route with its stops.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<DeliveryRoute>>> {
    Ok(Json(DeliveryRepository::new(state.pool()).list_routes().await?))
}

/// One route with its stops.
///
/// # Errors
///
/// 404 for an unknown route.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeliveryRoute>> {
    DeliveryRepository::new(state.pool())
        .get_route(DeliveryRouteId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Delivery route not found".to_string()))
}

/// Stops whose name contains `name`, cheapest first.
///
/// # Errors
///
/// 404 when nothing matches.
pub async fn search_stops(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<DeliveryStop>>> {
    let stops = DeliveryRepository::new(state.pool())
        .search_stops(&name)
        .await?;

    if stops.is_empty() {
        return Err(AppError::NotFound(format!(
            "No delivery stop matching '{}'",
            name.trim()
        )));
    }
    Ok(Json(stops))
}
