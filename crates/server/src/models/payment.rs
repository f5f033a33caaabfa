use chrono::{DateTime, Utc};
use serde::Serialize;

use schoolmall_core::{Money, OrderId, PaymentId, PaymentStatus};

/// A payment attempt against an order.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub transaction_id: String,
    pub payment_method: String,
    pub phone: Option<String>,
    pub amount: Money,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
