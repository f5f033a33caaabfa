//! Category tree and delivery route rules against a real database.
//!
//! Run with: cargo test -p schoolmall-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use schoolmall_integration_tests::{create_category, create_stop, test_pool, unique};
use schoolmall_server::db::categories::{CategoryError, CategoryUpdate, NewCategory};
use schoolmall_server::db::delivery::StopInput;
use schoolmall_server::db::{CategoryRepository, DeliveryRepository, RepositoryError};

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_reparenting_under_descendant_is_rejected() {
    let pool = test_pool().await;
    let root = create_category(&pool, None).await;
    let child = create_category(&pool, Some(root.id)).await;
    let grandchild = create_category(&pool, Some(child.id)).await;
    let repo = CategoryRepository::new(&pool);

    for parent in [root.id, grandchild.id] {
        let err = repo
            .update(
                root.id,
                &CategoryUpdate {
                    parent_id: Some(Some(parent)),
                    ..CategoryUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Cycle), "parent {parent}");
    }

    let unchanged = repo.get_by_id(root.id).await.unwrap().unwrap();
    assert_eq!(unchanged.parent_id, None);

    // Moving a leaf to the top level is fine
    let detached = repo
        .update(
            grandchild.id,
            &CategoryUpdate {
                parent_id: Some(None),
                ..CategoryUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(detached.parent_id, None);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_category_names_unique_and_slugs_deduplicated() {
    let pool = test_pool().await;
    let repo = CategoryRepository::new(&pool);
    let name = unique("Grade");

    let first = repo
        .create(&NewCategory {
            name: name.clone(),
            description: None,
            image: None,
            parent_id: None,
            is_active: true,
        })
        .await
        .unwrap();

    let duplicate = repo
        .create(&NewCategory {
            name: name.clone(),
            description: None,
            image: None,
            parent_id: None,
            is_active: true,
        })
        .await;
    assert!(matches!(duplicate, Err(CategoryError::DuplicateName)));

    // Different name, same slug
    let sibling = repo
        .create(&NewCategory {
            name: format!("{name}!"),
            description: None,
            image: None,
            parent_id: None,
            is_active: true,
        })
        .await
        .unwrap();
    assert_ne!(first.slug, sibling.slug);
    assert!(sibling.slug.starts_with(&first.slug));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_unknown_parent_is_rejected() {
    let pool = test_pool().await;
    let result = CategoryRepository::new(&pool)
        .create(&NewCategory {
            name: unique("Orphan"),
            description: None,
            image: None,
            parent_id: Some(schoolmall_core::CategoryId::new(i32::MAX)),
            is_active: true,
        })
        .await;
    assert!(matches!(result, Err(CategoryError::ParentNotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_duplicate_stop_in_route_is_rejected() {
    let pool = test_pool().await;
    let repo = DeliveryRepository::new(&pool);
    let name = unique("Route");

    let result = repo
        .create_route(
            &name,
            &[
                StopInput {
                    name: "South B".to_owned(),
                    price: Decimal::from(300),
                },
                StopInput {
                    name: "South B".to_owned(),
                    price: Decimal::from(350),
                },
            ],
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    // The whole route was rolled back
    let routes = repo.list_routes().await.unwrap();
    assert!(routes.iter().all(|r| r.name != name));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SCHOOLMALL_TEST_DATABASE_URL)"]
async fn test_replacing_stops_swaps_the_whole_list() {
    let pool = test_pool().await;
    let stop = create_stop(&pool, 300).await;
    let repo = DeliveryRepository::new(&pool);

    let updated = repo
        .update_route(
            stop.route_id,
            None,
            Some(&[
                StopInput {
                    name: "Westlands".to_owned(),
                    price: Decimal::from(350),
                },
                StopInput {
                    name: "Kangemi".to_owned(),
                    price: Decimal::from(400),
                },
            ]),
        )
        .await
        .unwrap();

    let names: Vec<_> = updated.stops.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Westlands", "Kangemi"]);

    let found = repo.search_stops("kangemi").await.unwrap();
    assert!(found.iter().any(|s| s.route_id == stop.route_id));
}
