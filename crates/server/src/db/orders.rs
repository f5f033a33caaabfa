//! Order repository.
//!
//! Reads go through [`OrderRepository`]. Placement and status changes are
//! multi-step and run inside a caller-owned transaction, so their steps are
//! free functions taking an executor (see `services::orders`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use schoolmall_core::{
    DeliveryStopId, Email, Money, OrderId, OrderItemId, OrderPlan, OrderStatus, OrderStatusLogId,
    PaymentStatus, PlannedItem, ProductId, StatusTransition, UserId,
};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderItem, StatusLogEntry};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: Option<UserId>,
    email: String,
    phone: String,
    full_name: String,
    location: String,
    delivery_stop_id: Option<DeliveryStopId>,
    delivery_fee: Decimal,
    total_amount: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            email: row.email,
            phone: row.phone,
            full_name: row.full_name,
            location: row.location,
            delivery_stop_id: row.delivery_stop_id,
            delivery_fee: Money::new(row.delivery_fee),
            total_amount: Money::new(row.total_amount),
            status: row.status,
            payment_status: row.payment_status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: Money::new(row.price),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusLogRow {
    id: OrderStatusLogId,
    order_id: OrderId,
    old_status: OrderStatus,
    new_status: OrderStatus,
    changed_at: DateTime<Utc>,
    changed_by_admin_id: Option<UserId>,
}

impl From<StatusLogRow> for StatusLogEntry {
    fn from(row: StatusLogRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            old_status: row.old_status,
            new_status: row.new_status,
            changed_at: row.changed_at,
            changed_by_admin_id: row.changed_by_admin_id,
        }
    }
}

/// Customer-facing order header fields, fixed before pricing.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub email: Email,
    pub phone: String,
    pub full_name: String,
    pub location: String,
    pub delivery_stop_id: DeliveryStopId,
    pub notes: Option<String>,
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, email, phone, full_name, location, \
     delivery_stop_id, delivery_fee, total_amount, status, payment_status, notes, \
     created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, price";

const LOG_COLUMNS: &str =
    "id, order_id, old_status, new_status, changed_at, changed_by_admin_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// An order with items, status history and next legal statuses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.items(id).await?;
        let log = self.status_log(id).await?;
        Ok(Some(OrderDetail::new(order, items, log)))
    }

    /// Find an order by number, only if `email` matches (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_tracking(
        &self,
        email: &Email,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order
             WHERE order_number = upper($1) AND lower(email) = lower($2)"
        ))
        .bind(order_number.trim())
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Orders newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order
             WHERE $1::shop.order_status IS NULL OR status = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The `limit` most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Total number of orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM shop.order")
            .fetch_one(self.pool)
            .await?)
    }

    /// Items of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop.order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Status history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_log(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<StatusLogEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusLogRow>(&format!(
            "SELECT {LOG_COLUMNS} FROM shop.order_status_log
             WHERE order_id = $1
             ORDER BY changed_at, id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

/// Insert the order header for a priced plan.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on an order number collision.
pub async fn insert_order<'e>(
    executor: impl PgExecutor<'e>,
    new: &NewOrder,
    plan: &OrderPlan,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        INSERT INTO shop.order (
            order_number, user_id, email, phone, full_name, location,
            delivery_stop_id, delivery_fee, total_amount, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(&new.order_number)
    .bind(new.user_id)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.full_name)
    .bind(&new.location)
    .bind(new.delivery_stop_id)
    .bind(plan.delivery_fee.amount())
    .bind(plan.total.amount())
    .bind(&new.notes)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::unique(e, "order number already exists"))?;

    Ok(row.into())
}

/// Insert the planned items with their frozen prices.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_items(
    conn: &mut sqlx::PgConnection,
    order_id: OrderId,
    items: &[PlannedItem],
) -> Result<Vec<OrderItem>, RepositoryError> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            INSERT INTO shop.order_item (order_id, product_id, product_name, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price.amount())
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row.into());
    }
    Ok(inserted)
}

/// Read an order's status and hold its row lock until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_status<'e>(
    executor: impl PgExecutor<'e>,
    id: OrderId,
) -> Result<Option<OrderStatus>, RepositoryError> {
    Ok(
        sqlx::query_scalar("SELECT status FROM shop.order WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?,
    )
}

/// Append a status log entry for a validated transition.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn append_status_log<'e>(
    executor: impl PgExecutor<'e>,
    order_id: OrderId,
    transition: StatusTransition,
    admin_id: Option<UserId>,
) -> Result<StatusLogEntry, RepositoryError> {
    let row = sqlx::query_as::<_, StatusLogRow>(&format!(
        r"
        INSERT INTO shop.order_status_log (order_id, old_status, new_status, changed_by_admin_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {LOG_COLUMNS}
        "
    ))
    .bind(order_id)
    .bind(transition.from())
    .bind(transition.to())
    .bind(admin_id)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Write a new status and/or payment status. `None` leaves a field alone.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn update_statuses<'e>(
    executor: impl PgExecutor<'e>,
    id: OrderId,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        UPDATE shop.order SET
            status = COALESCE($2, status),
            payment_status = COALESCE($3, payment_status)
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status)
    .bind(payment_status)
    .fetch_optional(executor)
    .await?;

    row.map(Into::into).ok_or(RepositoryError::NotFound)
}
