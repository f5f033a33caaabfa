//! Category administration.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use schoolmall_core::CategoryId;

use super::{non_blank, present};
use crate::db::{CategoryRepository, RepositoryError};
use crate::db::categories::{CategoryUpdate, NewCategory};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::{Category, PageParams};
use crate::state::AppState;

/// Default admin page size.
const DEFAULT_LIMIT: i64 = 10;

/// A page of categories.
#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub categories: Vec<Category>,
}

/// Search query with pagination.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// New category body.
#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Partial update body. `"parent_id": null` moves the category to the top.
#[derive(Debug, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<CategoryId>>,
    pub is_active: Option<bool>,
}

/// Paginated list of every category.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<CategoryPage>> {
    let window = page.window(DEFAULT_LIMIT)?;
    let (categories, total) = CategoryRepository::new(state.pool())
        .page(None, window)
        .await?;

    Ok(Json(CategoryPage {
        total,
        skip: window.skip,
        limit: window.limit,
        categories,
    }))
}

/// Categories whose name contains `q`.
///
/// # Errors
///
/// 400 for an empty query.
pub async fn search(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CategoryPage>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest("Search query is required".to_string()));
    }

    let window = PageParams {
        skip: query.skip,
        limit: query.limit,
    }
    .window(DEFAULT_LIMIT)?;
    let (categories, total) = CategoryRepository::new(state.pool())
        .page(Some(q), window)
        .await?;

    Ok(Json(CategoryPage {
        total,
        skip: window.skip,
        limit: window.limit,
        categories,
    }))
}

/// One category, active or not.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get_by_id(CategoryId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// Create a category; its slug is derived from the name.
///
/// # Errors
///
/// 400 for a blank name, 409 for a duplicate name, 404 for an unknown parent.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = non_blank(Some(body.name))
        .ok_or_else(|| AppError::BadRequest("Category name is required".to_string()))?;

    let category = CategoryRepository::new(state.pool())
        .create(&NewCategory {
            name,
            description: non_blank(body.description),
            image: non_blank(body.image),
            parent_id: body.parent_id,
            is_active: body.is_active,
        })
        .await?;

    tracing::info!(category_id = %category.id, slug = %category.slug, admin_id = %admin.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename, re-parent or toggle a category.
///
/// # Errors
///
/// 400 when the move would create a cycle, 404 for unknown ids, 409 for a
/// duplicate name.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateCategory>,
) -> Result<Json<Category>> {
    let name = match body.name {
        Some(name) => Some(
            non_blank(Some(name))
                .ok_or_else(|| AppError::BadRequest("Category name cannot be blank".to_string()))?,
        ),
        None => None,
    };

    let category = CategoryRepository::new(state.pool())
        .update(
            CategoryId::new(id),
            &CategoryUpdate {
                name,
                description: body.description,
                image: body.image,
                parent_id: body.parent_id,
                is_active: body.is_active,
            },
        )
        .await?;

    tracing::info!(category_id = %category.id, admin_id = %admin.id, "Category updated");
    Ok(Json(category))
}

/// Delete a category.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("Category not found".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(category_id = id, admin_id = %admin.id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
