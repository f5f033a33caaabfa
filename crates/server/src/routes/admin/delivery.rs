//! Delivery route administration.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use schoolmall_core::DeliveryRouteId;

use crate::db::delivery::StopInput;
use crate::db::{DeliveryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::models::DeliveryRoute;
use crate::state::AppState;

/// New route body.
#[derive(Debug, Deserialize)]
pub struct CreateRoute {
    pub name: String,
    #[serde(default)]
    pub stops: Vec<StopInput>,
}

/// Route update body. `stops`, when present, replaces the whole set.
#[derive(Debug, Deserialize)]
pub struct UpdateRoute {
    pub name: Option<String>,
    pub stops: Option<Vec<StopInput>>,
}

fn clean_name(name: &str, what: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(format!("{what} name is required")));
    }
    Ok(name.to_owned())
}

fn clean_stops(stops: Vec<StopInput>) -> Result<Vec<StopInput>> {
    stops
        .into_iter()
        .map(|stop| {
            if stop.price.is_sign_negative() {
                return Err(AppError::BadRequest(format!(
                    "Delivery fee for '{}' cannot be negative",
                    stop.name.trim()
                )));
            }
            Ok(StopInput {
                name: clean_name(&stop.name, "Stop")?,
                price: stop.price,
            })
        })
        .collect()
}

fn route_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Delivery route not found".to_string()),
        other => other.into(),
    }
}

/// Every route with its stops.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeliveryRoute>>> {
    Ok(Json(DeliveryRepository::new(state.pool()).list_routes().await?))
}

/// One route.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeliveryRoute>> {
    DeliveryRepository::new(state.pool())
        .get_route(DeliveryRouteId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Delivery route not found".to_string()))
}

/// Create a route with its stops.
///
/// # Errors
///
/// 400 for blank names or negative fees, 409 for a duplicate route name or
/// a stop repeated within the route.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateRoute>,
) -> Result<(StatusCode, Json<DeliveryRoute>)> {
    let name = clean_name(&body.name, "Route")?;
    let stops = clean_stops(body.stops)?;

    let route = DeliveryRepository::new(state.pool())
        .create_route(&name, &stops)
        .await?;

    tracing::info!(route_id = %route.id, stops = route.stops.len(), admin_id = %admin.id, "Delivery route created");
    Ok((StatusCode::CREATED, Json(route)))
}

/// Rename a route and/or replace its stops.
///
/// # Errors
///
/// 404 for an unknown id, plus the `create` errors.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateRoute>,
) -> Result<Json<DeliveryRoute>> {
    let name = body
        .name
        .as_deref()
        .map(|name| clean_name(name, "Route"))
        .transpose()?;
    let stops = body.stops.map(clean_stops).transpose()?;

    let route = DeliveryRepository::new(state.pool())
        .update_route(DeliveryRouteId::new(id), name.as_deref(), stops.as_deref())
        .await
        .map_err(route_not_found)?;

    tracing::info!(route_id = %route.id, admin_id = %admin.id, "Delivery route updated");
    Ok(Json(route))
}

/// Delete a route and its stops. Orders keep their fee.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    DeliveryRepository::new(state.pool())
        .delete_route(DeliveryRouteId::new(id))
        .await
        .map_err(route_not_found)?;

    tracing::info!(route_id = id, admin_id = %admin.id, "Delivery route deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_clean_stops_trims_and_validates() {
        let stops = clean_stops(vec![StopInput {
            name: "  South B ".into(),
            price: Decimal::from(300),
        }])
        .unwrap();
        assert_eq!(stops.first().unwrap().name, "South B");

        assert!(
            clean_stops(vec![StopInput {
                name: " ".into(),
                price: Decimal::ONE,
            }])
            .is_err()
        );
        assert!(
            clean_stops(vec![StopInput {
                name: "CBD".into(),
                price: Decimal::NEGATIVE_ONE,
            }])
            .is_err()
        );
    }
}
