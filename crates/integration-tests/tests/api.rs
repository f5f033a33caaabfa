//! HTTP flows against a live server on an ephemeral port.
//!
//! Run with: cargo test -p schoolmall-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use schoolmall_integration_tests::{
    ADMIN_PASSWORD, client, create_admin, create_product, create_stop, spawn_app, test_pool,
    unique,
};

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_checkout_and_track() {
    let pool = test_pool().await;
    let book = create_product(&pool, 250, 10).await;
    let stop = create_stop(&pool, 300).await;
    let base = spawn_app(pool).await;
    let http = client();

    let resp = http
        .post(format!("{base}/orders"))
        .json(&json!({
            "full_name": "Jane Parent",
            "email": "jane.parent@example.com",
            "phone": "0712345678",
            "location": "Gate B",
            "delivery_stop_id": stop.id,
            "items": [{"product_id": book.id, "quantity": 2}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(decimal(&order["total_amount"]), Decimal::from(800));
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    let order_number = order["order_number"].as_str().unwrap();
    let resp = http
        .get(format!("{base}/orders/track"))
        .query(&[
            ("email", "Jane.Parent@example.com"),
            ("order_number", order_number),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tracked: Value = resp.json().await.unwrap();
    assert_eq!(tracked["id"], order["id"]);

    let resp = http
        .get(format!("{base}/orders/track"))
        .query(&[("email", "other@example.com"), ("order_number", order_number)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_checkout_rejects_short_stock() {
    let pool = test_pool().await;
    let book = create_product(&pool, 250, 1).await;
    let stop = create_stop(&pool, 300).await;
    let base = spawn_app(pool).await;

    let resp = client()
        .post(format!("{base}/orders"))
        .json(&json!({
            "full_name": "Jane Parent",
            "email": "jane@example.com",
            "phone": "0712345678",
            "location": "Gate B",
            "delivery_stop_id": stop.id,
            "items": [{"product_id": book.id, "quantity": 2}]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["detail"],
        format!("Insufficient stock for {}. Available: 1", book.name)
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_admin_session_and_status_workflow() {
    let pool = test_pool().await;
    let book = create_product(&pool, 250, 10).await;
    let stop = create_stop(&pool, 300).await;
    let admin_email = create_admin(&pool).await;
    let base = spawn_app(pool).await;
    let http = client();

    let resp = http
        .post(format!("{base}/auth/login"))
        .json(&json!({"email": admin_email, "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = http
        .post(format!("{base}/auth/login"))
        .json(&json!({"email": admin_email, "password": ADMIN_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http.get(format!("{base}/admin/dashboard")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let order: Value = http
        .post(format!("{base}/orders"))
        .json(&json!({
            "full_name": "Jane Parent",
            "email": "jane@example.com",
            "phone": "0712345678",
            "location": "Gate B",
            "delivery_stop_id": stop.id,
            "items": [{"product_id": book.id, "quantity": 1}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = order["id"].as_i64().unwrap();

    let resp = http
        .put(format!("{base}/admin/orders/{id}/status"))
        .json(&json!({"status": "delivered"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["current_status"], "pending");
    assert_eq!(body["requested_status"], "delivered");
    assert_eq!(body["allowed"], json!(["confirmed", "cancelled"]));

    let resp = http
        .put(format!("{base}/admin/orders/{id}/status"))
        .json(&json!({"status": "confirmed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let change: Value = resp.json().await.unwrap();
    assert_eq!(change["old_status"], "pending");
    assert_eq!(change["new_status"], "confirmed");
    assert_eq!(change["allowed_next"], json!(["processing", "cancelled"]));

    let log: Value = http
        .get(format!("{base}/admin/orders/{id}/status-log"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries.first().unwrap()["changed_by_admin_id"].is_i64());

    let resp = http.post(format!("{base}/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = http.get(format!("{base}/admin/dashboard")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_mpesa_payment_marks_order_paid() {
    let pool = test_pool().await;
    let book = create_product(&pool, 250, 10).await;
    let stop = create_stop(&pool, 300).await;
    let base = spawn_app(pool).await;
    let http = client();

    let order: Value = http
        .post(format!("{base}/orders"))
        .json(&json!({
            "full_name": "Jane Parent",
            "email": "jane@example.com",
            "phone": "0712345678",
            "location": "Gate B",
            "delivery_stop_id": stop.id,
            "items": [{"product_id": book.id, "quantity": 1}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let started: Value = http
        .post(format!("{base}/payments/mpesa"))
        .json(&json!({"order_id": order["id"], "phone": "254712345678"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(started["success"], true);
    let transaction_id = started["checkout_request_id"].as_str().unwrap().to_owned();

    let resp = http
        .post(format!("{base}/payments/mpesa/callback"))
        .json(&json!({
            "checkout_request_id": transaction_id,
            "result_code": 0,
            "receipt_number": "QK12ABC"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A replayed failure callback cannot undo the settlement
    let resp = http
        .post(format!("{base}/payments/mpesa/callback"))
        .json(&json!({
            "checkout_request_id": transaction_id,
            "result_code": 1032,
            "result_desc": "Request cancelled by user"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let payment: Value = http
        .get(format!("{base}/payments/verify/{transaction_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(payment["status"], "completed");
    assert_eq!(decimal(&payment["amount"]), Decimal::from(550));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_admin_creates_and_updates_delivery_route() {
    let pool = test_pool().await;
    let admin_email = create_admin(&pool).await;
    let base = spawn_app(pool).await;
    let http = client();

    let resp = http
        .post(format!("{base}/auth/login"))
        .json(&json!({"email": admin_email, "password": ADMIN_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let name = unique("Thika Road");
    let resp = http
        .post(format!("{base}/admin/delivery-routes"))
        .json(&json!({
            "name": name,
            "stops": [{"name": "Roysambu", "price": "250"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let route: Value = resp.json().await.unwrap();
    let id = route["id"].as_i64().unwrap();

    let resp = http
        .post(format!("{base}/admin/delivery-routes"))
        .json(&json!({"name": name, "stops": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = http
        .put(format!("{base}/admin/delivery-routes/{id}"))
        .json(&json!({
            "stops": [
                {"name": "Kasarani", "price": "300"},
                {"name": "Ruiru", "price": "400"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], name.as_str());
    let stops: Vec<_> = updated["stops"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(stops, vec!["Kasarani", "Ruiru"]);
    assert_eq!(decimal(&updated["stops"][1]["price"]), Decimal::from(400));
}
