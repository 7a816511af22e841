//! Cart engine tests against a real on-disk SQLite store

use tempfile::TempDir;

use super::CartEngine;
use crate::db::DbService;
use crate::db::models::{Category, CartStatus, Product, ProductCreate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, PageQuery};

async fn setup() -> (CartEngine, DbService, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let db = DbService::new(path.to_str().unwrap()).await.unwrap();
    (CartEngine::new(db.clone()), db, dir)
}

async fn seed_product(db: &DbService, name: &str, price: &str) -> Product {
    let mut conn = db.acquire().await.unwrap();
    ProductRepository::create(
        &mut conn,
        ProductCreate {
            name: name.to_string(),
            description: None,
            price: price.parse().unwrap(),
            category: Category::Gadgets,
            in_stock: Some(true),
        },
    )
    .await
    .unwrap()
}

fn page(n: u32) -> PageQuery {
    PageQuery {
        page: Some(n),
        search: None,
    }
}

// ── Single pending cart ─────────────────────────────────────────────

#[tokio::test]
async fn second_explicit_create_conflicts() {
    let (engine, _db, _dir) = setup().await;
    engine.create_cart("alice").await.unwrap();
    let err = engine.create_cart("alice").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn pending_cart_is_idempotent_per_user() {
    let (engine, _db, _dir) = setup().await;
    let first = engine.pending_cart("alice").await.unwrap();
    let second = engine.pending_cart("alice").await.unwrap();
    assert_eq!(first.id, second.id);

    // A different user gets their own cart
    let other = engine.pending_cart("bob").await.unwrap();
    assert_ne!(first.id, other.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pending_cart_access_yields_one_cart() {
    let (engine, _db, _dir) = setup().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(
            async move { engine.pending_cart("alice").await },
        ));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1, "all concurrent accesses must see one cart");

    let carts = engine.list_carts("alice", None).await.unwrap();
    assert_eq!(carts.len(), 1);
}

#[tokio::test]
async fn cart_listing_filters_by_status() {
    let (engine, _db, _dir) = setup().await;
    let first = engine.pending_cart("alice").await.unwrap();
    engine
        .transition_status(first.id, "alice", CartStatus::Paid)
        .await
        .unwrap();
    let second = engine.pending_cart("alice").await.unwrap();

    let all = engine.list_carts("alice", None).await.unwrap();
    assert_eq!(all.len(), 2);

    let paid = engine
        .list_carts("alice", Some(CartStatus::Paid))
        .await
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].id, first.id);

    let pending = engine
        .list_carts("alice", Some(CartStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);

    let cancelled = engine
        .list_carts("alice", Some(CartStatus::Cancelled))
        .await
        .unwrap();
    assert!(cancelled.is_empty());
}

// ── Merge-on-add ────────────────────────────────────────────────────

#[tokio::test]
async fn adding_same_product_merges_quantities() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();

    let first = engine.add_item(cart.id, "alice", product.id, 2).await.unwrap();
    let merged = engine.add_item(cart.id, "alice", product.id, 3).await.unwrap();
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 5);

    let detail = engine.get_cart(cart.id, "alice").await.unwrap();
    assert_eq!(detail.items_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_of_same_product_lose_no_update() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let engine = engine.clone();
        let (cart_id, product_id) = (cart.id, product.id);
        handles.push(tokio::spawn(async move {
            engine.add_item(cart_id, "alice", product_id, 1).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let detail = engine.get_cart(cart.id, "alice").await.unwrap();
    assert_eq!(detail.items_count, 1);
    assert_eq!(detail.items[0].quantity, 6);
}

// ── Totals ──────────────────────────────────────────────────────────

#[tokio::test]
async fn cart_total_is_exact() {
    let (engine, db, _dir) = setup().await;
    let widget = seed_product(&db, "Widget", "10.00").await;
    let gizmo = seed_product(&db, "Gizmo", "5.50").await;
    let cart = engine.pending_cart("alice").await.unwrap();

    engine.add_item(cart.id, "alice", widget.id, 2).await.unwrap();
    engine.add_item(cart.id, "alice", gizmo.id, 3).await.unwrap();

    let detail = engine.get_cart(cart.id, "alice").await.unwrap();
    assert_eq!(detail.total_price.to_string(), "36.50");
    assert_eq!(detail.items_count, 2);
}

#[tokio::test]
async fn item_snapshot_reflects_product_name_and_price() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "19.99").await;
    let cart = engine.pending_cart("alice").await.unwrap();

    let item = engine.add_item(cart.id, "alice", product.id, 1).await.unwrap();
    assert_eq!(item.product_name, "Widget");
    assert_eq!(item.product_price.to_string(), "19.99");
}

// ── Status machine ──────────────────────────────────────────────────

#[tokio::test]
async fn pending_cart_can_be_paid_or_cancelled() {
    let (engine, _db, _dir) = setup().await;
    let cart = engine.pending_cart("alice").await.unwrap();
    let paid = engine
        .transition_status(cart.id, "alice", CartStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.status, CartStatus::Paid);

    // A new pending cart is allowed once the old one is terminal
    let next = engine.pending_cart("alice").await.unwrap();
    assert_ne!(next.id, cart.id);
    let cancelled = engine
        .transition_status(next.id, "alice", CartStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, CartStatus::Cancelled);
}

#[tokio::test]
async fn same_state_transition_is_a_noop() {
    let (engine, _db, _dir) = setup().await;
    let cart = engine.pending_cart("alice").await.unwrap();
    engine
        .transition_status(cart.id, "alice", CartStatus::Paid)
        .await
        .unwrap();

    let again = engine
        .transition_status(cart.id, "alice", CartStatus::Paid)
        .await
        .unwrap();
    assert_eq!(again.status, CartStatus::Paid);
}

#[tokio::test]
async fn terminal_carts_reject_transitions_and_items() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();
    let item = engine.add_item(cart.id, "alice", product.id, 1).await.unwrap();
    engine
        .transition_status(cart.id, "alice", CartStatus::Paid)
        .await
        .unwrap();

    let err = engine
        .transition_status(cart.id, "alice", CartStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = engine.add_item(cart.id, "alice", product.id, 1).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = engine.set_item_quantity(item.id, "alice", 5).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = engine.remove_item(item.id, "alice").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

// ── Ownership scoping ───────────────────────────────────────────────

#[tokio::test]
async fn other_users_carts_look_missing() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();
    let item = engine.add_item(cart.id, "alice", product.id, 1).await.unwrap();

    let err = engine.get_cart(cart.id, "bob").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = engine.get_item(item.id, "bob").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = engine.delete_cart(cart.id, "bob").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = engine.remove_item(item.id, "bob").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();

    let err = engine.add_item(cart.id, "alice", product.id, 0).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let item = engine.add_item(cart.id, "alice", product.id, 1).await.unwrap();
    let err = engine.set_item_quantity(item.id, "alice", -2).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let (engine, _db, _dir) = setup().await;
    let cart = engine.pending_cart("alice").await.unwrap();
    let err = engine.add_item(cart.id, "alice", 9999, 1).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ── Item lifecycle and pagination ───────────────────────────────────

#[tokio::test]
async fn quantity_replacement_and_removal() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();
    let item = engine.add_item(cart.id, "alice", product.id, 2).await.unwrap();

    let updated = engine.set_item_quantity(item.id, "alice", 7).await.unwrap();
    assert_eq!(updated.quantity, 7);

    engine.remove_item(item.id, "alice").await.unwrap();
    let err = engine.get_item(item.id, "alice").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let detail = engine.get_cart(cart.id, "alice").await.unwrap();
    assert_eq!(detail.items_count, 0);
    assert_eq!(detail.total_price.to_string(), "0.00");
}

#[tokio::test]
async fn item_listing_paginates() {
    let (engine, db, _dir) = setup().await;
    let cart = engine.pending_cart("alice").await.unwrap();
    for i in 0..12 {
        let product = seed_product(&db, &format!("Product {i}"), "1.00").await;
        engine.add_item(cart.id, "alice", product.id, 1).await.unwrap();
    }

    let first = engine.list_items(cart.id, "alice", &page(1)).await.unwrap();
    assert_eq!(first.count, 12);
    assert_eq!(first.results.len(), 10);

    let second = engine.list_items(cart.id, "alice", &page(2)).await.unwrap();
    assert_eq!(second.results.len(), 2);
}

#[tokio::test]
async fn deleting_a_cart_cascades_to_items() {
    let (engine, db, _dir) = setup().await;
    let product = seed_product(&db, "Widget", "10.00").await;
    let cart = engine.pending_cart("alice").await.unwrap();
    let item = engine.add_item(cart.id, "alice", product.id, 1).await.unwrap();

    engine.delete_cart(cart.id, "alice").await.unwrap();

    let err = engine.get_cart(cart.id, "alice").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = engine.get_item(item.id, "alice").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
