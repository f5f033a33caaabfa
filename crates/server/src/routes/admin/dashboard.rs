//! Admin dashboard summary.

use axum::extract::State;
use serde::Serialize;

use crate::db::{OrderRepository, ProductRepository};
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::state::AppState;

/// How many recent orders the dashboard shows.
const RECENT_ORDERS: i64 = 5;

/// Dashboard counters.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_products: i64,
    pub total_orders: i64,
    pub recent_orders: Vec<Order>,
}

/// Counts and the latest orders.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let orders = OrderRepository::new(state.pool());

    Ok(Json(Dashboard {
        total_products: ProductRepository::new(state.pool()).count_active().await?,
        total_orders: orders.count().await?,
        recent_orders: orders.recent(RECENT_ORDERS).await?,
    }))
}
