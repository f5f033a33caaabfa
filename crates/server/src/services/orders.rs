//! Order placement and status transitions.
//!
//! Both operations run inside a single database transaction. Placement locks
//! every product row in the cart before pricing it; a status change locks the
//! order row before checking the transition, so two admins racing on the same
//! order are serialized and the loser sees the winner's status.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use schoolmall_core::{
    CartLine, DeliveryStopId, Email, InvalidTransition, OrderId, OrderStatus, PaymentStatus,
    PlacementError, UserId, new_order_number, plan_order,
};

use crate::db::{self, OrderRepository, RepositoryError};
use crate::models::{Order, OrderItem, StatusLogEntry};

/// Errors from order placement and status changes.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// A customer field failed validation.
    #[error("{0}")]
    Invalid(String),

    /// The cart could not be priced.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// The selected delivery stop does not exist.
    #[error("Delivery stop {0} not found")]
    StopNotFound(DeliveryStopId),

    /// The order does not exist.
    #[error("Order not found")]
    NotFound,

    /// The requested status is not reachable from the current one.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// A status change request carried neither field.
    #[error("Provide status or payment_status")]
    NothingToChange,

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// A checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkout {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub delivery_stop_id: DeliveryStopId,
    pub items: Vec<CartLine>,
}

/// Customer details after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Customer {
    full_name: String,
    email: Email,
    phone: String,
    location: String,
    notes: Option<String>,
}

impl Checkout {
    fn customer(&self) -> Result<Customer, OrderError> {
        let required = |value: &str, field: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(OrderError::Invalid(format!("{field} is required")))
            } else {
                Ok(value.to_owned())
            }
        };

        Ok(Customer {
            full_name: required(&self.full_name, "full_name")?,
            email: Email::parse(&self.email)
                .map_err(|e| OrderError::Invalid(format!("Invalid email: {e}")))?,
            phone: required(&self.phone, "phone")?,
            location: required(&self.location, "location")?,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_owned),
        })
    }
}

/// A freshly placed order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Requested status and/or payment status.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

/// The outcome of a status change.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub order: Order,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub allowed_next: Vec<OrderStatus>,
    pub log_entry: Option<StatusLogEntry>,
}

/// Order workflows.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Validate, price and persist a checkout.
    ///
    /// Nothing is written unless every line can be fulfilled.
    ///
    /// # Errors
    ///
    /// `OrderError::Invalid` and `OrderError::Placement` for bad input or
    /// short stock, `OrderError::StopNotFound` for an unknown stop.
    pub async fn place(
        &self,
        checkout: &Checkout,
        user_id: Option<UserId>,
    ) -> Result<PlacedOrder, OrderError> {
        let customer = checkout.customer()?;
        let lines = schoolmall_core::merge_lines(&checkout.items)?;

        let mut tx = self.pool.begin().await?;

        let stop = db::delivery::find_stop(&mut *tx, checkout.delivery_stop_id)
            .await?
            .ok_or(OrderError::StopNotFound(checkout.delivery_stop_id))?;

        let ids: Vec<_> = lines.iter().map(|line| line.product_id).collect();
        let products = db::products::lock_for_order(&mut *tx, &ids).await?;
        let plan = plan_order(&lines, &products, stop.price)?;

        let new = db::orders::NewOrder {
            order_number: new_order_number(),
            user_id,
            email: customer.email,
            phone: customer.phone,
            full_name: customer.full_name,
            location: customer.location,
            delivery_stop_id: stop.id,
            notes: customer.notes,
        };
        let order = db::orders::insert_order(&mut *tx, &new, &plan).await?;
        let items = db::orders::insert_items(&mut *tx, order.id, &plan.items).await?;

        for item in &plan.items {
            if !db::products::decrement_stock(&mut *tx, item.product_id, item.quantity).await? {
                let available = products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map_or(0, |p| p.stock_quantity);
                return Err(PlacementError::InsufficientStock {
                    product_id: item.product_id,
                    name: item.product_name.clone(),
                    available,
                    requested: item.quantity,
                }
                .into());
            }
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            items = items.len(),
            "Order placed"
        );

        Ok(PlacedOrder { order, items })
    }

    /// Move an order to a new status and/or payment status.
    ///
    /// A status change appends exactly one log entry in the same transaction
    /// as the update. A payment-only change writes no log entry.
    ///
    /// # Errors
    ///
    /// `OrderError::NothingToChange` for an empty request,
    /// `OrderError::NotFound` for an unknown order and
    /// `OrderError::InvalidTransition` when the move is not allowed. Nothing
    /// is written on error.
    pub async fn change_status(
        &self,
        order_id: OrderId,
        update: StatusUpdate,
        admin_id: Option<UserId>,
    ) -> Result<StatusChange, OrderError> {
        if update.status.is_none() && update.payment_status.is_none() {
            return Err(OrderError::NothingToChange);
        }

        let mut tx = self.pool.begin().await?;

        let current = db::orders::lock_status(&mut *tx, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let log_entry = match update.status {
            Some(target) => {
                let transition = current.transition_to(target)?;
                Some(
                    db::orders::append_status_log(&mut *tx, order_id, transition, admin_id)
                        .await?,
                )
            }
            None => None,
        };

        let order =
            db::orders::update_statuses(&mut *tx, order_id, update.status, update.payment_status)
                .await?;

        tx.commit().await?;

        if let Some(entry) = &log_entry {
            tracing::info!(
                order_id = %order_id,
                from = %entry.old_status,
                to = %entry.new_status,
                admin_id = ?admin_id,
                "Order status changed"
            );
        }

        Ok(StatusChange {
            old_status: current,
            new_status: order.status,
            allowed_next: order.status.allowed_transitions().to_vec(),
            order,
            log_entry,
        })
    }

    /// Find an order by customer email and order number.
    ///
    /// # Errors
    ///
    /// `OrderError::NotFound` unless both match.
    pub async fn track(&self, email: &str, order_number: &str) -> Result<PlacedOrder, OrderError> {
        let email = Email::parse(email).map_err(|_| OrderError::NotFound)?;
        let orders = OrderRepository::new(self.pool);

        let order = orders
            .find_for_tracking(&email, order_number.trim())
            .await?
            .ok_or(OrderError::NotFound)?;
        let items = orders.items(order.id).await?;

        Ok(PlacedOrder { order, items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use schoolmall_core::ProductId;

    use super::*;

    fn checkout() -> Checkout {
        Checkout {
            full_name: "  Jane Parent ".to_owned(),
            email: "Jane@School.CO.KE".to_owned(),
            phone: "0712345678".to_owned(),
            location: "South B".to_owned(),
            notes: Some("   ".to_owned()),
            delivery_stop_id: DeliveryStopId::new(2),
            items: vec![CartLine {
                product_id: ProductId::new(1),
                quantity: 1,
            }],
        }
    }

    #[test]
    fn test_customer_trims_and_normalizes() {
        let customer = checkout().customer().unwrap();
        assert_eq!(customer.full_name, "Jane Parent");
        assert_eq!(customer.email.as_str(), "Jane@school.co.ke");
        assert_eq!(customer.notes, None);
    }

    #[test]
    fn test_customer_requires_fields() {
        let mut blank_phone = checkout();
        blank_phone.phone = " ".to_owned();
        let err = blank_phone.customer().unwrap_err();
        assert_eq!(err.to_string(), "phone is required");

        let mut bad_email = checkout();
        bad_email.email = "not-an-email".to_owned();
        assert!(matches!(bad_email.customer(), Err(OrderError::Invalid(_))));
    }

    #[test]
    fn test_checkout_deserializes() {
        let checkout: Checkout = serde_json::from_str(
            r#"{
                "full_name": "Jane",
                "email": "jane@example.com",
                "phone": "0712",
                "location": "CBD",
                "delivery_stop_id": 1,
                "items": [{"product_id": 4, "quantity": 2}]
            }"#,
        )
        .unwrap();
        assert_eq!(checkout.notes, None);
        assert_eq!(checkout.items.len(), 1);
        assert_eq!(checkout.items.first().unwrap().quantity, 2);
    }

    #[test]
    fn test_status_update_fields_optional() {
        let update: StatusUpdate = serde_json::from_str(r#"{"status": "shipped"}"#).unwrap();
        assert_eq!(update.status, Some(OrderStatus::Shipped));
        assert_eq!(update.payment_status, None);

        let empty: StatusUpdate = serde_json::from_str("{}").unwrap();
        assert!(empty.status.is_none() && empty.payment_status.is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(OrderError::NotFound.to_string(), "Order not found");
        assert_eq!(
            OrderError::StopNotFound(DeliveryStopId::new(9)).to_string(),
            "Delivery stop 9 not found"
        );
        assert_eq!(
            OrderError::from(PlacementError::EmptyCart).to_string(),
            "Order must contain at least one item"
        );
    }
}
