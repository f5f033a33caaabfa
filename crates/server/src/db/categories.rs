//! Category repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use schoolmall_core::{CategoryId, slug, would_create_cycle};

use super::{RepositoryError, like_pattern};
use crate::models::Category;
use crate::models::pagination::Window;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    parent_id: Option<CategoryId>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image: row.image,
            parent_id: row.parent_id,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new category. The slug is derived from `name`.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
}

/// Partial category update; `None` leaves a field alone.
///
/// `parent_id: Some(None)` detaches the category to the top level.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Option<CategoryId>>,
    pub is_active: Option<bool>,
}

/// Errors specific to category writes.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category name already exists")]
    DuplicateName,
    #[error("Parent category not found")]
    ParentNotFound,
    #[error("A category cannot be moved under itself or one of its descendants")]
    Cycle,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CategoryError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, parent_id, is_active, created_at, updated_at";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name, optionally only active ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.category
             WHERE is_active OR NOT $1
             ORDER BY name"
        ))
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One page of categories, newest first, with the total count.
    ///
    /// When `query` is set only names containing it (case-insensitive) match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn page(
        &self,
        query: Option<&str>,
        window: Window,
    ) -> Result<(Vec<Category>, i64), RepositoryError> {
        let pattern = query.map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.category WHERE $1::text IS NULL OR name ILIKE $1",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.category
             WHERE $1::text IS NULL OR name ILIKE $1
             ORDER BY created_at DESC, id DESC
             OFFSET $2 LIMIT $3"
        ))
        .bind(pattern.as_deref())
        .bind(window.skip)
        .bind(window.limit)
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.category WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an active category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.category WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category with a unique slug derived from its name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::DuplicateName` when the name is taken and
    /// `CategoryError::ParentNotFound` for an unknown parent.
    pub async fn create(&self, new: &NewCategory) -> Result<Category, CategoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent) = new.parent_id
            && !exists(&mut *tx, parent).await?
        {
            return Err(CategoryError::ParentNotFound);
        }

        let slug = unique_slug(&mut *tx, &new.name, None).await?;
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            INSERT INTO shop.category (name, slug, description, image, parent_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&slug)
        .bind(&new.description)
        .bind(&new.image)
        .bind(new.parent_id)
        .bind(new.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_name_conflict)?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Apply a partial update. Renaming regenerates the slug; re-parenting
    /// is refused when it would put the category under its own subtree.
    ///
    /// # Errors
    ///
    /// `Repository(NotFound)` for an unknown id, plus the `create` errors and
    /// `CategoryError::Cycle`.
    pub async fn update(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, CategoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the whole tree so concurrent moves cannot interleave into a loop
        let links: Vec<(CategoryId, Option<CategoryId>)> =
            sqlx::query_as("SELECT id, parent_id FROM shop.category ORDER BY id FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;
        let parents: HashMap<CategoryId, Option<CategoryId>> = links.into_iter().collect();

        if !parents.contains_key(&id) {
            return Err(RepositoryError::NotFound.into());
        }

        if let Some(Some(parent)) = update.parent_id {
            if !parents.contains_key(&parent) {
                return Err(CategoryError::ParentNotFound);
            }
            if would_create_cycle(&parents, id, parent) {
                return Err(CategoryError::Cycle);
            }
        }

        let slug = match &update.name {
            Some(name) => Some(unique_slug(&mut *tx, name, Some(id)).await?),
            None => None,
        };

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            UPDATE shop.category SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                image = COALESCE($5, image),
                parent_id = CASE WHEN $6 THEN $7 ELSE parent_id END,
                is_active = COALESCE($8, is_active)
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&slug)
        .bind(&update.description)
        .bind(&update.image)
        .bind(update.parent_id.is_some())
        .bind(update.parent_id.flatten())
        .bind(update.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_name_conflict)?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete a category. Children move to the top level and products
    /// lose their category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn map_name_conflict(e: sqlx::Error) -> CategoryError {
    match RepositoryError::unique(e, "category") {
        RepositoryError::Conflict(_) => CategoryError::DuplicateName,
        other => other.into(),
    }
}

async fn exists(conn: &mut sqlx::PgConnection, id: CategoryId) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.category WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await
}

/// First free slug among `base`, `base-1`, `base-2`, ... ignoring `except`.
async fn unique_slug(
    conn: &mut sqlx::PgConnection,
    name: &str,
    except: Option<CategoryId>,
) -> Result<String, sqlx::Error> {
    let base = match schoolmall_core::slugify(name) {
        s if s.is_empty() => "category".to_owned(),
        s => s,
    };

    let taken: Vec<String> = sqlx::query_scalar(
        "SELECT slug FROM shop.category
         WHERE (slug = $1 OR slug LIKE $1 || '-%') AND ($2::int IS NULL OR id <> $2)",
    )
    .bind(&base)
    .bind(except)
    .fetch_all(conn)
    .await?;

    let free = slug::candidates(&base).find(|candidate| !taken.contains(candidate));
    Ok(free.unwrap_or(base))
}
