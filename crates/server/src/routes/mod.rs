//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /auth/login                 - Admin login (sets session cookie)
//! POST /auth/logout                - Logout
//! GET  /auth/me                    - Current session user
//!
//! # Catalog
//! GET  /categories                 - Active categories
//! GET  /categories/tree            - Active categories, nested
//! GET  /categories/{slug}          - Category with breadcrumbs and children
//! GET  /products                   - Active products (filters, pagination)
//! GET  /products/{id}              - Active product
//! GET  /products/slug/{slug}       - Active product by slug
//! GET  /hero-banners               - Home page banners
//!
//! # Orders
//! POST /orders                     - Place an order
//! GET  /orders/track               - Track by email and order number
//!
//! # Delivery
//! GET  /delivery/routes            - Routes with stops
//! GET  /delivery/routes/{id}       - One route
//! GET  /delivery/stops/{name}      - Stop search
//!
//! # Payments (M-Pesa)
//! POST /payments/mpesa             - Start a payment
//! POST /payments/mpesa/callback    - Provider callback
//! GET  /payments/verify/{tx_id}    - Payment status
//!
//! # Admin (see `admin`)
//! /admin/...
//! ```

pub mod admin;
pub mod auth;
pub mod banners;
pub mod categories;
pub mod delivery;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/tree", get(categories::tree))
        .route("/{slug}", get(categories::show))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/slug/{slug}", get(products::show_by_slug))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::place))
        .route("/track", get(orders::track))
}

/// Create the delivery routes router.
pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/routes", get(delivery::index))
        .route("/routes/{id}", get(delivery::show))
        .route("/stops/{name}", get(delivery::search_stops))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/mpesa", post(payments::start_mpesa))
        .route("/mpesa/callback", post(payments::mpesa_callback))
        .route("/verify/{transaction_id}", get(payments::verify))
}

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/delivery", delivery_routes())
        .nest("/payments", payment_routes())
        .route("/hero-banners", get(banners::index))
        .nest("/admin", admin::routes())
}
