//! SQLite store and repository tests

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::models::{Category, FieldPatch, ItemKind, MoveIntent, Product, ProfileUpdate};

use menu_server::core::ResourceVersions;
use menu_server::db::DbService;
use menu_server::db::repository::{RepoError, category, product};
use menu_server::reorder::OrderObserver;
use menu_server::{CatalogStore, MoveOutcome, RecordStore, ReorderEngine, RollbackPolicies, SqliteStore};

struct NoopObserver;

#[async_trait::async_trait]
impl OrderObserver for NoopObserver {
    async fn order_changed(&self, _change: shared::message::OrderChangedPayload) {}
}

fn category_record(id: i64, sort_order: i32) -> Category {
    Category {
        id,
        name: format!("Category {id}"),
        description: Some("desc".into()),
        image_url: None,
        sort_order,
        is_available: true,
        created_at: 1_700_000_000_000,
    }
}

fn product_record(id: i64, category_id: Option<i64>, sort_order: i32) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        description: None,
        price: Decimal::new(1250, 2),
        image_url: Some("products/tea.webp".into()),
        category_id,
        sort_order,
        is_available: true,
        created_at: 1_700_000_000_000,
    }
}

async fn seeded_store() -> SqliteStore {
    let store = SqliteStore::new(DbService::in_memory().await.unwrap());
    for (id, rank) in [(1, 0), (2, 1), (3, 2)] {
        store.insert_category(&category_record(id, rank)).await.unwrap();
    }
    for (id, parent, rank) in [(10, Some(1), 0), (11, Some(1), 1), (20, Some(2), 0)] {
        store.insert_product(&product_record(id, parent, rank)).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_fetch_orders_by_rank_then_id() {
    let store = SqliteStore::new(DbService::in_memory().await.unwrap());
    store.insert_category(&category_record(3, 1)).await.unwrap();
    store.insert_category(&category_record(2, 1)).await.unwrap();
    store.insert_category(&category_record(1, 5)).await.unwrap();

    let ids: Vec<i64> = store
        .fetch_categories()
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[tokio::test]
async fn test_price_survives_roundtrip() {
    let store = seeded_store().await;
    let products = store.fetch_products().await.unwrap();
    let tea = products.iter().find(|p| p.id == 10).unwrap();
    assert_eq!(tea.price, Decimal::new(1250, 2));
    assert_eq!(tea.image_url.as_deref(), Some("products/tea.webp"));
}

#[tokio::test]
async fn test_update_fields_writes_only_present_fields() {
    let store = seeded_store().await;

    store
        .update_fields(ItemKind::Product, 10, &FieldPatch::placement(3, Some(2)))
        .await
        .unwrap();
    store
        .update_fields(ItemKind::Product, 11, &FieldPatch::availability(false))
        .await
        .unwrap();

    let products = store.fetch_products().await.unwrap();
    let moved = products.iter().find(|p| p.id == 10).unwrap();
    assert_eq!((moved.category_id, moved.sort_order), (Some(2), 3));
    let hidden = products.iter().find(|p| p.id == 11).unwrap();
    assert_eq!((hidden.category_id, hidden.sort_order, hidden.is_available), (Some(1), 1, false));
}

#[tokio::test]
async fn test_category_patch_cannot_reparent() {
    let store = seeded_store().await;
    let result = store
        .update_fields(ItemKind::Category, 1, &FieldPatch::placement(0, Some(2)))
        .await;
    assert!(matches!(result, Err(RepoError::Validation(_))));
}

#[tokio::test]
async fn test_unknown_parent_is_rejected() {
    let store = seeded_store().await;
    let result = store
        .update_fields(ItemKind::Product, 10, &FieldPatch::placement(0, Some(999)))
        .await;
    assert!(matches!(result, Err(RepoError::Validation(_))));
}

#[tokio::test]
async fn test_update_missing_record_is_not_found() {
    let store = seeded_store().await;
    let result = store
        .update_fields(ItemKind::Category, 404, &FieldPatch::rank(0))
        .await;
    assert!(matches!(result, Err(RepoError::NotFound(_))));

    let result = store.delete_record(ItemKind::Product, 404).await;
    assert!(matches!(result, Err(RepoError::NotFound(_))));
}

#[tokio::test]
async fn test_category_delete_nulls_product_parent() {
    let store = seeded_store().await;
    store.delete_record(ItemKind::Category, 1).await.unwrap();

    let products = store.fetch_products().await.unwrap();
    for id in [10, 11] {
        let p = products.iter().find(|p| p.id == id).unwrap();
        assert_eq!(p.category_id, None);
    }
    assert_eq!(products.iter().find(|p| p.id == 20).unwrap().category_id, Some(2));
}

#[tokio::test]
async fn test_repository_find_by_id() {
    let db = DbService::in_memory().await.unwrap();
    category::insert(&db.pool, &category_record(7, 0)).await.unwrap();
    product::insert(&db.pool, &product_record(70, Some(7), 0)).await.unwrap();

    let found = category::find_by_id(&db.pool, 7).await.unwrap().unwrap();
    assert_eq!(found, category_record(7, 0));
    assert!(category::find_by_id(&db.pool, 8).await.unwrap().is_none());

    let found = product::find_by_id(&db.pool, 70).await.unwrap().unwrap();
    assert_eq!(found, product_record(70, Some(7), 0));
}

#[tokio::test]
async fn test_duplicate_insert_is_reported() {
    let store = seeded_store().await;
    let result = store.insert_category(&category_record(1, 9)).await;
    assert!(matches!(result, Err(RepoError::Duplicate(_))));
}

#[tokio::test]
async fn test_profile_partial_update() {
    let store = seeded_store().await;

    let profile = store.get_profile().await.unwrap();
    assert_eq!(profile.id, 1);
    assert_eq!(profile.business_name, "");

    store
        .update_profile(&ProfileUpdate {
            cover_image_url: Some("covers/main.webp".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let profile = store
        .update_profile(&ProfileUpdate {
            business_name: Some("Cafe".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(profile.business_name, "Cafe");
    assert_eq!(profile.cover_image_url.as_deref(), Some("covers/main.webp"));
    assert!(profile.updated_at.is_some());
}

#[tokio::test]
async fn test_engine_over_sqlite() {
    let store = Arc::new(seeded_store().await);
    let engine = Arc::new(ReorderEngine::new(
        store.clone(),
        Arc::new(NoopObserver),
        Arc::new(ResourceVersions::new()),
        RollbackPolicies::default(),
    ));
    engine.load().await.unwrap();

    let outcome = engine.reorder_categories(MoveIntent::new(3, 1)).await.unwrap();
    assert_eq!(outcome, MoveOutcome::Settled { version: 1 });

    engine
        .reorder_or_reparent_products(MoveIntent::new(11, 20))
        .await
        .unwrap();
    engine.delete(ItemKind::Category, 2).await.unwrap();

    assert_eq!(engine.categories(), store.fetch_categories().await.unwrap());
    assert_eq!(engine.products(), store.fetch_products().await.unwrap());

    let ranks: Vec<(i64, i32)> = engine.categories().iter().map(|c| (c.id, c.sort_order)).collect();
    assert_eq!(ranks, vec![(3, 0), (1, 1)]);

    // 11 and 20 lost their category and now trail the uncategorized list
    let uncategorized: Vec<(i64, i32)> = engine
        .products()
        .iter()
        .filter(|p| p.category_id.is_none())
        .map(|p| (p.id, p.sort_order))
        .collect();
    assert_eq!(uncategorized, vec![(11, 0), (20, 1)]);
}

#[tokio::test]
async fn test_database_file_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("menu.db");
    let path = path.to_string_lossy();

    {
        let store = SqliteStore::new(DbService::new(&path).await.unwrap());
        store.insert_category(&category_record(1, 0)).await.unwrap();
        store
            .update_fields(ItemKind::Category, 1, &FieldPatch::availability(false))
            .await
            .unwrap();
    }

    let store = SqliteStore::new(DbService::new(&path).await.unwrap());
    let categories = store.fetch_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert!(!categories[0].is_available);
}
