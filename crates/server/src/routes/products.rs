//! Public product listing.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use schoolmall_core::{CategoryId, ProductId};

use crate::db::ProductRepository;
use crate::db::products::ProductFilter;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::{PageParams, Product};
use crate::state::AppState;

/// Default page size for the storefront.
const DEFAULT_LIMIT: i64 = 20;

/// Listing filters.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<i32>,
    pub q: Option<String>,
    pub featured: Option<bool>,
    pub on_sale: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub products: Vec<Product>,
}

/// Active products, newest first.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let window = PageParams {
        skip: query.skip,
        limit: query.limit,
    }
    .window(DEFAULT_LIMIT)?;

    let filter = ProductFilter {
        category_id: query.category.map(CategoryId::new),
        query: query.q.filter(|q| !q.trim().is_empty()),
        featured: query.featured,
        on_sale: query.on_sale,
    };

    let (products, total) = ProductRepository::new(state.pool())
        .list_active(&filter, window)
        .await?;

    Ok(Json(ProductPage {
        total,
        skip: window.skip,
        limit: window.limit,
        products,
    }))
}

/// One active product.
///
/// # Errors
///
/// 404 for a missing or inactive product.
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active_by_id(ProductId::new(id))
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// One active product by slug.
///
/// # Errors
///
/// 404 for a missing or inactive product.
pub async fn show_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}
