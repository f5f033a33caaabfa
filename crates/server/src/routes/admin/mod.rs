//! Admin API. Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin).
//!
//! ```text
//! GET    /admin/dashboard
//! GET    /admin/categories              - Paginated list
//! GET    /admin/categories/search       - Name search, paginated
//! POST   /admin/categories
//! GET    /admin/categories/{id}
//! PUT    /admin/categories/{id}
//! DELETE /admin/categories/{id}
//! GET    /admin/products                - All products, newest first
//! GET    /admin/products/search
//! POST   /admin/products
//! GET    /admin/products/{id}
//! PUT    /admin/products/{id}
//! DELETE /admin/products/{id}
//! GET    /admin/orders                  - Optional ?status filter
//! GET    /admin/orders/{id}             - Order, items, status log
//! PUT    /admin/orders/{id}/status      - Status transition
//! GET    /admin/orders/{id}/status-log
//! GET    /admin/delivery-routes
//! POST   /admin/delivery-routes
//! GET    /admin/delivery-routes/{id}
//! PUT    /admin/delivery-routes/{id}
//! DELETE /admin/delivery-routes/{id}
//! GET    /admin/banners
//! POST   /admin/banners
//! GET    /admin/banners/{id}
//! PUT    /admin/banners/{id}
//! DELETE /admin/banners/{id}
//! POST   /admin/uploads                 - Multipart image upload
//! ```

pub mod banners;
pub mod categories;
pub mod dashboard;
pub mod delivery;
pub mod orders;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use serde::{Deserialize, Deserializer};

use crate::state::AppState;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::index))
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/search", get(categories::search))
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/products", get(products::index).post(products::create))
        .route("/products/search", get(products::search))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/status-log", get(orders::status_log))
        .route(
            "/delivery-routes",
            get(delivery::index).post(delivery::create),
        )
        .route(
            "/delivery-routes/{id}",
            get(delivery::show)
                .put(delivery::update)
                .delete(delivery::delete),
        )
        .route("/banners", get(banners::index).post(banners::create))
        .route(
            "/banners/{id}",
            get(banners::show).put(banners::update).delete(banners::delete),
        )
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "present")]`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Trim a text field, treating blank as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use schoolmall_core::CategoryId;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        parent_id: Option<Option<CategoryId>>,
    }

    #[test]
    fn test_present_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.parent_id, None);

        let null: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let set: Patch = serde_json::from_str(r#"{"parent_id": 4}"#).unwrap();
        assert_eq!(set.parent_id, Some(Some(CategoryId::new(4))));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Pens ".into())), Some("Pens".into()));
        assert_eq!(non_blank(None), None);
    }
}
