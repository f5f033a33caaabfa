//! Delivery zones.

use chrono::{DateTime, Utc};
use serde::Serialize;

use schoolmall_core::{DeliveryRouteId, DeliveryStopId, Money};

/// A named stop on a route with a flat delivery fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryStop {
    pub id: DeliveryStopId,
    pub route_id: DeliveryRouteId,
    pub name: String,
    pub price: Money,
}

/// A delivery route with its stops, ordered by stop id.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRoute {
    pub id: DeliveryRouteId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub stops: Vec<DeliveryStop>,
}
