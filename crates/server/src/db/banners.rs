//! Hero banner repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use schoolmall_core::HeroBannerId;

use super::RepositoryError;
use crate::models::HeroBanner;

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: HeroBannerId,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BannerRow> for HeroBanner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Banner fields; on update `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct BannerInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

const BANNER_COLUMNS: &str = "id, title, subtitle, description, image, created_at, updated_at";

/// Repository for hero banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All banners, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<HeroBanner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.hero_banner ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a banner by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: HeroBannerId) -> Result<Option<HeroBanner>, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.hero_banner WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a banner. Title and image are required.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        title: &str,
        image: &str,
        subtitle: Option<&str>,
        description: Option<&str>,
    ) -> Result<HeroBanner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            r"
            INSERT INTO shop.hero_banner (title, subtitle, description, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {BANNER_COLUMNS}
            "
        ))
        .bind(title)
        .bind(subtitle)
        .bind(description)
        .bind(image)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown banner.
    pub async fn update(
        &self,
        id: HeroBannerId,
        input: &BannerInput,
    ) -> Result<HeroBanner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            r"
            UPDATE shop.hero_banner SET
                title = COALESCE($2, title),
                subtitle = COALESCE($3, subtitle),
                description = COALESCE($4, description),
                image = COALESCE($5, image)
            WHERE id = $1
            RETURNING {BANNER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete(&self, id: HeroBannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.hero_banner WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
