//! Order administration and status transitions.

use axum::extract::State;
use serde::Deserialize;

use schoolmall_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::{Order, OrderDetail, StatusLogEntry};
use crate::services::OrderService;
use crate::services::orders::{StatusChange, StatusUpdate};
use crate::state::AppState;

/// Listing filter.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// All orders, newest first, optionally with one status.
///
/// # Errors
///
/// 400 for an unknown status, 500 on database failure.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        OrderRepository::new(state.pool()).list(query.status).await?,
    ))
}

/// An order with its items, status history and next legal statuses.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .detail(OrderId::new(id))
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Move an order through its lifecycle.
///
/// # Errors
///
/// 400 for an empty body, 404 for an unknown order, 409 when the
/// transition is not allowed from the current status.
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<StatusChange>> {
    let change = OrderService::new(state.pool())
        .change_status(OrderId::new(id), update, Some(admin.id))
        .await?;
    Ok(Json(change))
}

/// Status history, oldest first.
///
/// # Errors
///
/// 404 for an unknown order.
pub async fn status_log(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<StatusLogEntry>>> {
    let orders = OrderRepository::new(state.pool());
    let id = OrderId::new(id);

    if orders.get(id).await?.is_none() {
        return Err(order_not_found());
    }
    Ok(Json(orders.status_log(id).await?))
}
