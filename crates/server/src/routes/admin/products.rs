//! Product administration.

use axum::{extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use schoolmall_core::{CategoryId, ProductId, slugify};

use super::non_blank;
use crate::db::products::{NewProduct, ProductUpdate};
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::services::uploads::remove_local_image;
use crate::state::AppState;

/// Name search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// New product body. The slug defaults to one derived from the name.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub on_sale: bool,
}

const fn default_active() -> bool {
    true
}

/// Partial update body.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub on_sale: Option<bool>,
}

fn check_amounts(
    price: Option<Decimal>,
    original_price: Option<Decimal>,
    stock_quantity: Option<i32>,
) -> Result<()> {
    if price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::BadRequest("price cannot be negative".to_string()));
    }
    if original_price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::BadRequest(
            "original_price cannot be negative".to_string(),
        ));
    }
    if stock_quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest(
            "stock_quantity cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn product_slug(name: &str, requested: Option<String>) -> Result<String> {
    let slug = slugify(&non_blank(requested).unwrap_or_else(|| name.to_owned()));
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "slug must contain letters or digits".to_string(),
        ));
    }
    Ok(slug)
}

fn not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

/// Every product, newest first.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_all(None).await?))
}

/// Products whose name contains `q`.
///
/// # Errors
///
/// 400 for an empty query.
pub async fn search(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest("Search query is required".to_string()));
    }
    Ok(Json(
        ProductRepository::new(state.pool()).list_all(Some(q)).await?,
    ))
}

/// One product, active or not.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Create a product.
///
/// # Errors
///
/// 400 for invalid fields, 409 for a duplicate slug.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let name = non_blank(Some(body.name))
        .ok_or_else(|| AppError::BadRequest("Product name is required".to_string()))?;
    check_amounts(Some(body.price), body.original_price, Some(body.stock_quantity))?;
    let slug = product_slug(&name, body.slug)?;

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            name,
            slug,
            description: non_blank(body.description),
            price: body.price,
            original_price: body.original_price,
            stock_quantity: body.stock_quantity,
            category_id: body.category_id,
            image: non_blank(body.image),
            is_active: body.is_active,
            is_featured: body.is_featured,
            on_sale: body.on_sale,
        })
        .await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, admin_id = %admin.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Apply a partial update. A replaced local image is deleted from disk.
///
/// # Errors
///
/// 400 for invalid fields, 404 for an unknown id, 409 for a duplicate slug.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<Product>> {
    check_amounts(body.price, body.original_price, body.stock_quantity)?;
    let name = match body.name {
        Some(name) => Some(
            non_blank(Some(name))
                .ok_or_else(|| AppError::BadRequest("Product name cannot be blank".to_string()))?,
        ),
        None => None,
    };
    let slug = match body.slug {
        Some(slug) => Some(product_slug(name.as_deref().unwrap_or_default(), Some(slug))?),
        None => None,
    };

    let (product, replaced_image) = ProductRepository::new(state.pool())
        .update(
            ProductId::new(id),
            &ProductUpdate {
                name,
                slug,
                description: body.description,
                price: body.price,
                original_price: body.original_price,
                stock_quantity: body.stock_quantity,
                category_id: body.category_id,
                image: body.image,
                is_active: body.is_active,
                is_featured: body.is_featured,
                on_sale: body.on_sale,
            },
        )
        .await
        .map_err(not_found)?;

    if let Some(old) = replaced_image {
        remove_local_image(&state.config().upload_dir, &old).await;
    }

    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product updated");
    Ok(Json(product))
}

/// Delete a product and its local image.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let product = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
        .map_err(not_found)?;

    if let Some(image) = &product.image {
        remove_local_image(&state.config().upload_dir, image).await;
    }

    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
