//! Categories and products.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use schoolmall_core::{CategoryId, Money, ProductId, ProductSnapshot, ancestry};

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product listing.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub original_price: Option<Money>,
    pub stock_quantity: i32,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub on_sale: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock_quantity: product.stock_quantity,
            is_active: product.is_active,
        }
    }
}

/// A category with its nested children.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Self>,
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A category page: the category, how to get there, and what is below it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub children: Vec<Category>,
}

/// Nest a flat category list under its roots.
///
/// Categories whose parent is not in `categories` become roots. Siblings
/// keep the input order.
#[must_use]
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let ids: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<CategoryId, Vec<Category>> = HashMap::new();
    let mut roots = Vec::new();

    for category in categories {
        match category.parent_id {
            Some(parent) if ids.contains(&parent) && parent != category.id => {
                children.entry(parent).or_default().push(category);
            }
            _ => roots.push(category),
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

fn attach(category: Category, children: &mut HashMap<CategoryId, Vec<Category>>) -> CategoryNode {
    let kids = children.remove(&category.id).unwrap_or_default();
    CategoryNode {
        children: kids
            .into_iter()
            .map(|child| attach(child, children))
            .collect(),
        category,
    }
}

/// Breadcrumbs from the root down to `target`.
#[must_use]
pub fn breadcrumbs(all: &[Category], target: CategoryId) -> Vec<Breadcrumb> {
    let parents: HashMap<CategoryId, Option<CategoryId>> =
        all.iter().map(|c| (c.id, c.parent_id)).collect();
    let by_id: HashMap<CategoryId, &Category> = all.iter().map(|c| (c.id, c)).collect();

    ancestry(&parents, target)
        .into_iter()
        .filter_map(|id| by_id.get(&id))
        .map(|c| Breadcrumb {
            id: c.id,
            name: c.name.clone(),
            slug: c.slug.clone(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i32, name: &str, parent: Option<i32>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            slug: schoolmall_core::slugify(name),
            description: None,
            image: None,
            parent_id: parent.map(CategoryId::new),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Category> {
        vec![
            category(1, "Books", None),
            category(2, "Grade 1", Some(1)),
            category(3, "Grade 1 Readers", Some(2)),
            category(4, "Stationery", None),
            category(5, "Grade 2", Some(1)),
        ]
    }

    #[test]
    fn test_build_tree_nests_children() {
        let tree = build_tree(sample());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.name, "Books");
        let grades: Vec<&str> = tree[0]
            .children
            .iter()
            .map(|n| n.category.name.as_str())
            .collect();
        assert_eq!(grades, ["Grade 1", "Grade 2"]);
        assert_eq!(tree[0].children[0].children[0].category.name, "Grade 1 Readers");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_build_tree_orphans_become_roots() {
        let tree = build_tree(vec![category(7, "Toys", Some(99))]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].category.id, CategoryId::new(7));
    }

    #[test]
    fn test_breadcrumbs_root_first() {
        let crumbs = breadcrumbs(&sample(), CategoryId::new(3));
        let names: Vec<&str> = crumbs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Books", "Grade 1", "Grade 1 Readers"]);
        assert_eq!(crumbs.get(1).unwrap().slug, "grade-1");
    }

    #[test]
    fn test_tree_serializes_flat_fields() {
        let tree = build_tree(vec![category(1, "Books", None)]);
        let json = serde_json::to_value(tree.first().unwrap()).unwrap();
        assert_eq!(json["slug"], "books");
        assert!(json["children"].as_array().unwrap().is_empty());
    }
}
