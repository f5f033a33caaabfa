//! Checkout and order tracking.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::Result;
use crate::extract::{Json, Query};
use crate::middleware::OptionalUser;
use crate::services::email::spawn_new_order_notification;
use crate::services::OrderService;
use crate::services::orders::{Checkout, PlacedOrder};
use crate::state::AppState;

/// Place an order.
///
/// Responds 201 with the order and its items. The admin notification is
/// sent in the background after the order has been committed.
///
/// # Errors
///
/// 400 for invalid input or short stock, 404 for an unknown product or
/// delivery stop.
pub async fn place(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(checkout): Json<Checkout>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = OrderService::new(state.pool())
        .place(&checkout, user.map(|u| u.id))
        .await?;

    spawn_new_order_notification(
        state.email().cloned(),
        placed.order.clone(),
        placed.items.clone(),
    );

    Ok((StatusCode::CREATED, Json(placed)))
}

/// Tracking lookup.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub email: String,
    pub order_number: String,
}

/// Find an order by email and order number.
///
/// # Errors
///
/// 404 unless both match the same order.
pub async fn track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<PlacedOrder>> {
    let order = OrderService::new(state.pool())
        .track(&query.email, &query.order_number)
        .await?;
    Ok(Json(order))
}
