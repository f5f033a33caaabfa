//! Orders, their items and the status audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;

use schoolmall_core::{
    DeliveryStopId, Money, OrderId, OrderItemId, OrderStatus, OrderStatusLogId, PaymentStatus,
    ProductId, UserId,
};

/// An order header.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub email: String,
    pub phone: String,
    pub full_name: String,
    pub location: String,
    pub delivery_stop_id: Option<DeliveryStopId>,
    pub delivery_fee: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchased line with the unit price at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Money,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLogEntry {
    pub id: OrderStatusLogId,
    pub order_id: OrderId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by_admin_id: Option<UserId>,
}

/// An order with everything an admin needs to act on it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status_log: Vec<StatusLogEntry>,
    pub allowed_transitions: Vec<OrderStatus>,
}

impl OrderDetail {
    /// Assemble a detail view, deriving the next legal statuses.
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>, status_log: Vec<StatusLogEntry>) -> Self {
        let allowed_transitions = order.status.allowed_transitions().to_vec();
        Self {
            order,
            items,
            status_log,
            allowed_transitions,
        }
    }
}
