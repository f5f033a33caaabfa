//! Public category browsing.

use axum::extract::State;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::models::catalog::{breadcrumbs, build_tree};
use crate::models::{Category, CategoryDetail, CategoryNode};
use crate::state::AppState;

/// Active categories, flat, by name.
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list(true).await?))
}

/// Active categories nested under their parents.
///
/// # Errors
///
/// 500 on database failure.
pub async fn tree(State(state): State<AppState>) -> Result<Json<Vec<CategoryNode>>> {
    let categories = CategoryRepository::new(state.pool()).list(true).await?;
    Ok(Json(build_tree(categories)))
}

/// One active category with its breadcrumb trail and active children.
///
/// # Errors
///
/// 404 for an unknown or inactive slug.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>> {
    let repo = CategoryRepository::new(state.pool());
    let category = repo
        .get_active_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let all = repo.list(false).await?;
    let trail = breadcrumbs(&all, category.id);
    let children = all
        .into_iter()
        .filter(|c| c.is_active && c.parent_id == Some(category.id))
        .collect();

    Ok(Json(CategoryDetail {
        category,
        breadcrumbs: trail,
        children,
    }))
}
