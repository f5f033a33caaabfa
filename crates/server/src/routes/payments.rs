//! M-Pesa payment records.
//!
//! No STK push is sent; starting a payment records it as pending and the
//! callback settles it. A completed payment marks its order paid.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;

use schoolmall_core::{OrderId, PaymentStatus};

use crate::db::{PaymentRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::models::Payment;
use crate::state::AppState;

/// Payment request from the checkout page.
#[derive(Debug, Deserialize)]
pub struct MpesaRequest {
    pub order_id: OrderId,
    pub phone: String,
}

/// Acknowledgement of a started payment.
#[derive(Debug, Serialize)]
pub struct MpesaStarted {
    pub success: bool,
    pub message: &'static str,
    pub checkout_request_id: String,
}

/// Settlement notification.
///
/// `result_code` 0 means the customer paid; anything else is a failure.
#[derive(Debug, Deserialize)]
pub struct MpesaCallback {
    pub checkout_request_id: String,
    pub result_code: i32,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub result_desc: Option<String>,
}

/// Record a pending payment for an order's total.
///
/// # Errors
///
/// 400 for a blank phone number, 404 for an unknown order.
pub async fn start_mpesa(
    State(state): State<AppState>,
    Json(request): Json<MpesaRequest>,
) -> Result<Json<MpesaStarted>> {
    let phone = request.phone.trim();
    if phone.is_empty() {
        return Err(AppError::BadRequest("phone is required".to_string()));
    }

    let transaction_id = new_transaction_id();
    let payment = PaymentRepository::new(state.pool())
        .create_pending(request.order_id, &transaction_id, phone)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Order not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        order_id = %payment.order_id,
        transaction_id = %payment.transaction_id,
        amount = %payment.amount,
        "M-Pesa payment started"
    );

    Ok(Json(MpesaStarted {
        success: true,
        message: "STK Push sent successfully",
        checkout_request_id: payment.transaction_id,
    }))
}

/// Settle a payment from the provider callback.
///
/// # Errors
///
/// 404 for an unknown transaction, 409 if it was already settled.
pub async fn mpesa_callback(
    State(state): State<AppState>,
    Json(callback): Json<MpesaCallback>,
) -> Result<Json<serde_json::Value>> {
    let status = if callback.result_code == 0 {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Failed
    };
    let raw = json!({
        "result_code": callback.result_code,
        "result_desc": callback.result_desc,
    })
    .to_string();

    let payment = PaymentRepository::new(state.pool())
        .settle(
            &callback.checkout_request_id,
            status,
            callback.receipt_number.as_deref(),
            Some(&raw),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Payment not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        transaction_id = %payment.transaction_id,
        status = %payment.status,
        "M-Pesa payment settled"
    );

    Ok(Json(json!({ "ResultCode": 0, "ResultDesc": "Success" })))
}

/// Current state of a payment.
///
/// # Errors
///
/// 404 for an unknown transaction.
pub async fn verify(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Payment>> {
    PaymentRepository::new(state.pool())
        .get_by_transaction(&transaction_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
}

fn new_transaction_id() -> String {
    format!("ws_CO_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_ids_are_unique() {
        let a = new_transaction_id();
        let b = new_transaction_id();
        assert!(a.starts_with("ws_CO_"));
        assert_eq!(a.len(), "ws_CO_".len() + 32);
        assert_ne!(a, b);
    }
}
