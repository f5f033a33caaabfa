//! Payment record repository (M-Pesa).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use schoolmall_core::{Money, OrderId, PaymentId, PaymentStatus};

use super::{RepositoryError, orders};
use crate::models::Payment;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    transaction_id: String,
    payment_method: String,
    phone: Option<String>,
    amount: Decimal,
    status: PaymentStatus,
    provider_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            transaction_id: row.transaction_id,
            payment_method: row.payment_method,
            phone: row.phone,
            amount: Money::new(row.amount),
            status: row.status,
            provider_reference: row.provider_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, transaction_id, payment_method, phone, amount, \
     status, provider_reference, created_at, updated_at";

/// Repository for payment records.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending M-Pesa payment for the order's full total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order and
    /// `RepositoryError::Conflict` on a transaction id collision.
    pub async fn create_pending(
        &self,
        order_id: OrderId,
        transaction_id: &str,
        phone: &str,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            INSERT INTO shop.payment (order_id, transaction_id, payment_method, phone, amount)
            SELECT id, $2, 'mpesa', $3, total_amount FROM shop.order WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(transaction_id)
        .bind(phone)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "transaction id already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Get a payment by its transaction id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM shop.payment WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Settle a pending payment and mirror the outcome onto its order.
    ///
    /// A completed payment marks the order paid; a failed one leaves the
    /// order's payment status as it was. Only pending payments can be
    /// settled, so a repeated or late callback cannot overwrite the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown transaction and
    /// `RepositoryError::Conflict` if the payment is already settled.
    pub async fn settle(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
        provider_reference: Option<&str>,
        provider_response: Option<&str>,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            UPDATE shop.payment SET
                status = $2,
                provider_reference = COALESCE($3, provider_reference),
                provider_response = COALESCE($4, provider_response)
            WHERE transaction_id = $1 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(transaction_id)
        .bind(status)
        .bind(provider_reference)
        .bind(provider_response)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payment) = row.map(Payment::from) else {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM shop.payment WHERE transaction_id = $1)",
            )
            .bind(transaction_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(if exists {
                RepositoryError::Conflict("Payment already settled".to_string())
            } else {
                RepositoryError::NotFound
            });
        };

        if status == PaymentStatus::Completed {
            orders::update_statuses(&mut *tx, payment.order_id, None, Some(status)).await?;
        }

        tx.commit().await?;
        Ok(payment)
    }
}
