//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use schoolmall_core::{CategoryId, Money, ProductId, ProductSnapshot};

use super::{RepositoryError, like_pattern};
use crate::models::Product;
use crate::models::pagination::Window;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    original_price: Option<Decimal>,
    stock_quantity: i32,
    category_id: Option<CategoryId>,
    image: Option<String>,
    is_active: bool,
    is_featured: bool,
    on_sale: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: Money::new(row.price),
            original_price: row.original_price.map(Money::new),
            stock_quantity: row.stock_quantity,
            category_id: row.category_id,
            image: row.image,
            is_active: row.is_active,
            is_featured: row.is_featured,
            on_sale: row.on_sale,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: ProductId,
    name: String,
    price: Decimal,
    stock_quantity: i32,
    is_active: bool,
}

/// Storefront listing filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub query: Option<String>,
    pub featured: Option<bool>,
    pub on_sale: Option<bool>,
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub on_sale: bool,
}

/// Partial product update; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
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

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, original_price, \
     stock_quantity, category_id, image, is_active, is_featured, on_sale, created_at, updated_at";

const SLUG_TAKEN: &str = "Slug already exists";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products matching `filter`, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        filter: &ProductFilter,
        window: Window,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        const WHERE: &str = "WHERE is_active
              AND ($1::int IS NULL OR category_id = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
              AND ($3::bool IS NULL OR is_featured = $3)
              AND ($4::bool IS NULL OR on_sale = $4)";

        let pattern = filter.query.as_deref().map(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM shop.product {WHERE}"))
            .bind(filter.category_id)
            .bind(pattern.as_deref())
            .bind(filter.featured)
            .bind(filter.on_sale)
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product {WHERE}
             ORDER BY created_at DESC, id DESC
             OFFSET $5 LIMIT $6"
        ))
        .bind(filter.category_id)
        .bind(pattern.as_deref())
        .bind(filter.featured)
        .bind(filter.on_sale)
        .bind(window.skip)
        .bind(window.limit)
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Every product (active or not), newest first, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, query: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product
             WHERE $1::text IS NULL OR name ILIKE $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(query.map(like_pattern))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID regardless of visibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.get_by_id(id).await?.filter(|p| p.is_active))
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Number of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE is_active")
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product (
                name, slug, description, price, original_price, stock_quantity,
                category_id, image, is_active, is_featured, on_sale
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.original_price)
        .bind(new.stock_quantity)
        .bind(new.category_id)
        .bind(&new.image)
        .bind(new.is_active)
        .bind(new.is_featured)
        .bind(new.on_sale)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, SLUG_TAKEN))?;

        Ok(row.into())
    }

    /// Apply a partial update. Returns the updated product and, when the
    /// image changed, the image it replaced.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<(Product, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous_image: Option<Option<String>> =
            sqlx::query_scalar("SELECT image FROM shop.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let previous_image = previous_image.ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                original_price = COALESCE($6, original_price),
                stock_quantity = COALESCE($7, stock_quantity),
                category_id = COALESCE($8, category_id),
                image = COALESCE($9, image),
                is_active = COALESCE($10, is_active),
                is_featured = COALESCE($11, is_featured),
                on_sale = COALESCE($12, on_sale)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.slug)
        .bind(&update.description)
        .bind(update.price)
        .bind(update.original_price)
        .bind(update.stock_quantity)
        .bind(update.category_id)
        .bind(&update.image)
        .bind(update.is_active)
        .bind(update.is_featured)
        .bind(update.on_sale)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, SLUG_TAKEN))?;

        tx.commit().await?;

        let product: Product = row.into();
        let replaced = previous_image.filter(|old| product.image.as_deref() != Some(old.as_str()));
        Ok((product, replaced))
    }

    /// Delete a product, returning it so its image can be cleaned up.
    ///
    /// Order items keep their name and price snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM shop.product WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }
}

// =============================================================================
// Transaction steps for order placement
// =============================================================================

/// Load and row-lock the products an order references.
///
/// Locks are taken in id order so concurrent checkouts over overlapping
/// carts cannot deadlock. Missing ids are simply absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_for_order<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[ProductId],
) -> Result<Vec<ProductSnapshot>, RepositoryError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, name, price, stock_quantity, is_active
         FROM shop.product
         WHERE id = ANY($1)
         ORDER BY id
         FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProductSnapshot {
            id: row.id,
            name: row.name,
            price: Money::new(row.price),
            stock_quantity: row.stock_quantity,
            is_active: row.is_active,
        })
        .collect())
}

/// Take `quantity` units out of stock if at least that many remain.
///
/// Returns `false` (and changes nothing) when stock is short.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn decrement_stock<'e>(
    executor: impl PgExecutor<'e>,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.product
         SET stock_quantity = stock_quantity - $2
         WHERE id = $1 AND stock_quantity >= $2",
    )
    .bind(id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
