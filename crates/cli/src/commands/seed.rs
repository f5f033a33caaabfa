//! Seed the catalog and delivery routes from a YAML file.
//!
//! Seeding is idempotent: categories are matched by name, products by slug
//! and routes by name, and anything already present is skipped.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use schoolmall_core::{CategoryId, slugify};
use schoolmall_server::db::categories::{CategoryError, NewCategory};
use schoolmall_server::db::delivery::StopInput;
use schoolmall_server::db::products::NewProduct;
use schoolmall_server::db::{
    CategoryRepository, DeliveryRepository, ProductRepository, RepositoryError,
};

/// Top-level layout of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub routes: Vec<RouteSeed>,
}

/// A category, optionally with nested subcategories.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<CategorySeed>,
}

/// A product, filed under a category by name.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub on_sale: bool,
}

impl ProductSeed {
    fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }
}

/// A delivery route and its stops.
#[derive(Debug, Deserialize)]
pub struct RouteSeed {
    pub name: String,
    pub stops: Vec<StopInput>,
}

/// Counts reported after a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Categories in parent-before-child order, with their parent's name.
fn flatten(categories: &[CategorySeed]) -> Vec<(&CategorySeed, Option<&str>)> {
    fn walk<'a>(
        seeds: &'a [CategorySeed],
        parent: Option<&'a str>,
        out: &mut Vec<(&'a CategorySeed, Option<&'a str>)>,
    ) {
        for seed in seeds {
            out.push((seed, parent));
            walk(&seed.children, Some(&seed.name), out);
        }
    }

    let mut out = Vec::new();
    walk(categories, None, &mut out);
    out
}

/// Check a seed file for mistakes before touching the database.
///
/// Returns one message per problem; an empty list means the file is usable.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_names = HashSet::new();
    for (category, _) in flatten(&seed.categories) {
        if category.name.trim().is_empty() {
            errors.push("category with empty name".to_owned());
        } else if !category_names.insert(category.name.as_str()) {
            errors.push(format!("duplicate category '{}'", category.name));
        }
    }

    let mut slugs = HashSet::new();
    for product in &seed.products {
        if !category_names.contains(product.category.as_str()) {
            errors.push(format!(
                "product '{}' references unknown category '{}'",
                product.name, product.category
            ));
        }
        if product.price <= Decimal::ZERO {
            errors.push(format!("product '{}' must have a positive price", product.name));
        }
        if product.original_price.is_some_and(|p| p < Decimal::ZERO) {
            errors.push(format!("product '{}' has a negative original price", product.name));
        }
        if product.stock_quantity < 0 {
            errors.push(format!("product '{}' has negative stock", product.name));
        }
        if !slugs.insert(product.slug()) {
            errors.push(format!("duplicate product slug '{}'", product.slug()));
        }
    }

    let mut route_names = HashSet::new();
    for route in &seed.routes {
        if !route_names.insert(route.name.as_str()) {
            errors.push(format!("duplicate route '{}'", route.name));
        }
        if route.stops.is_empty() {
            errors.push(format!("route '{}' has no stops", route.name));
        }
        let mut stop_names = HashSet::new();
        for stop in &route.stops {
            if !stop_names.insert(stop.name.trim().to_lowercase()) {
                errors.push(format!("duplicate stop '{}' in route '{}'", stop.name, route.name));
            }
            if stop.price < Decimal::ZERO {
                errors.push(format!("stop '{}' has a negative price", stop.name));
            }
        }
    }

    errors
}

/// Load, validate and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails for a reason other than the row already
/// existing.
pub async fn run(pool: &PgPool, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let categories = seed_categories(pool, &seed.categories).await?;
    info!(
        inserted = categories.1.inserted,
        skipped = categories.1.skipped,
        "Categories seeded"
    );

    let products = seed_products(pool, &seed.products, &categories.0).await?;
    info!(
        inserted = products.inserted,
        skipped = products.skipped,
        "Products seeded"
    );

    let routes = seed_routes(pool, &seed.routes).await?;
    info!(
        inserted = routes.inserted,
        skipped = routes.skipped,
        "Delivery routes seeded"
    );

    info!("Seeding complete!");
    Ok(())
}

async fn seed_categories(
    pool: &PgPool,
    seeds: &[CategorySeed],
) -> Result<(HashMap<String, CategoryId>, SeedSummary), CategoryError> {
    let repo = CategoryRepository::new(pool);
    let mut ids: HashMap<String, CategoryId> = repo
        .list(false)
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    let mut summary = SeedSummary::default();

    for (seed, parent) in flatten(seeds) {
        if ids.contains_key(&seed.name) {
            summary.skipped += 1;
            continue;
        }

        let category = repo
            .create(&NewCategory {
                name: seed.name.clone(),
                description: seed.description.clone(),
                image: None,
                parent_id: parent.and_then(|name| ids.get(name).copied()),
                is_active: true,
            })
            .await?;
        ids.insert(category.name, category.id);
        summary.inserted += 1;
    }

    Ok((ids, summary))
}

async fn seed_products(
    pool: &PgPool,
    seeds: &[ProductSeed],
    categories: &HashMap<String, CategoryId>,
) -> Result<SeedSummary, RepositoryError> {
    let repo = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    for seed in seeds {
        let result = repo
            .create(&NewProduct {
                name: seed.name.clone(),
                slug: seed.slug(),
                description: seed.description.clone(),
                price: seed.price,
                original_price: seed.original_price,
                stock_quantity: seed.stock_quantity,
                category_id: categories.get(&seed.category).copied(),
                image: None,
                is_active: true,
                is_featured: seed.is_featured,
                on_sale: seed.on_sale,
            })
            .await;

        match result {
            Ok(_) => summary.inserted += 1,
            Err(RepositoryError::Conflict(_)) => summary.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

async fn seed_routes(pool: &PgPool, seeds: &[RouteSeed]) -> Result<SeedSummary, RepositoryError> {
    let repo = DeliveryRepository::new(pool);
    let mut summary = SeedSummary::default();

    for seed in seeds {
        match repo.create_route(&seed.name, &seed.stops).await {
            Ok(route) => {
                info!(route = %route.name, stops = route.stops.len(), "Added route");
                summary.inserted += 1;
            }
            Err(RepositoryError::Conflict(_)) => summary.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = include_str!("../../seed/catalog.yaml");

    #[test]
    fn test_bundled_catalog_is_valid() {
        let seed: SeedFile = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(validate(&seed), Vec::<String>::new());
        assert_eq!(seed.routes.len(), 9);
        assert!(!seed.products.is_empty());
    }

    #[test]
    fn test_bundled_catalog_delivery_fees() {
        let seed: SeedFile = serde_yaml::from_str(CATALOG).unwrap();
        let mombasa = seed.routes.iter().find(|r| r.name == "Mombasa Road").unwrap();
        let south_b = mombasa.stops.iter().find(|s| s.name == "South B").unwrap();
        assert_eq!(south_b.price, Decimal::from(300));
    }

    #[test]
    fn test_flatten_orders_parents_first() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
categories:
  - name: Books
    children:
      - name: Revision
        children:
          - name: KCPE
  - name: Toys
",
        )
        .unwrap();

        let flat: Vec<_> = flatten(&seed.categories)
            .into_iter()
            .map(|(c, parent)| (c.name.as_str(), parent))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Books", None),
                ("Revision", Some("Books")),
                ("KCPE", Some("Revision")),
                ("Toys", None),
            ]
        );
    }

    #[test]
    fn test_validate_reports_problems() {
        let seed: SeedFile = serde_yaml::from_str(
            r#"
categories:
  - name: Books
  - name: Books
products:
  - name: Atlas
    price: "0"
    stock_quantity: -1
    category: Maps
routes:
  - name: CBD Route
    stops:
      - { name: CBD, price: "100" }
      - { name: cbd, price: "100" }
  - name: Empty
    stops: []
"#,
        )
        .unwrap();

        let errors = validate(&seed);
        assert!(errors.contains(&"duplicate category 'Books'".to_owned()));
        assert!(errors.contains(&"product 'Atlas' references unknown category 'Maps'".to_owned()));
        assert!(errors.contains(&"product 'Atlas' must have a positive price".to_owned()));
        assert!(errors.contains(&"product 'Atlas' has negative stock".to_owned()));
        assert!(errors.contains(&"duplicate stop 'cbd' in route 'CBD Route'".to_owned()));
        assert!(errors.contains(&"route 'Empty' has no stops".to_owned()));
    }

    #[test]
    fn test_product_slug_defaults_to_name() {
        let product: ProductSeed = serde_yaml::from_str(
            r#"{ name: "Blue Pen (Pack of 10)", price: "150", stock_quantity: 1, category: Stationery }"#,
        )
        .unwrap();
        assert_eq!(product.slug(), "blue-pen-pack-of-10");
    }
}
