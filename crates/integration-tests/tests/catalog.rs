//! Catalog browsing and product administration against the mock service.
//!
//! Run with: cargo test -p pantry-integration-tests --test catalog

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use pantry_core::{CatalogQuery, ImageUpload, Price, ProductDraft, ProductId};
use pantry_integration_tests::MockServer;
use pantry_storefront::{ApiError, ErrorKind};

fn seed(server: &MockServer) -> Vec<String> {
    [
        ("Greek Yogurt", "dairy", 6.49),
        ("Cheddar", "Dairy", 8.0),
        ("Rye Bread", "bakery", 4.25),
        ("Bananas", "produce", 1.99),
        ("Spinach", "produce", 2.5),
        ("Almond Butter", "pantry", 11.0),
        ("Oat Milk", "beverages", 3.75),
    ]
    .into_iter()
    .map(|(name, category, price)| server.state().add_product(name, category, price))
    .collect()
}

fn draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        category: "snacks".to_string(),
        price: Price::from_minor(399),
        description: "Crunchy and salty".to_string(),
        image: None,
    }
}

// ============================================================================
// Browsing
// ============================================================================

#[tokio::test]
async fn test_listing_keeps_server_order_and_prices() {
    let server = MockServer::start().await;
    let ids = seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.app(dir.path()).await;

    let products = app
        .catalog()
        .products(None, &CatalogQuery::default())
        .await
        .unwrap();

    assert_eq!(products.len(), 7);
    assert_eq!(products[0].id, ProductId::new(&ids[0]));
    assert_eq!(products[0].price, Price::from_minor(649));
    assert_eq!(products[0].display_category(), "Dairy");
    assert!(products[0].created_at.is_some());
}

#[tokio::test]
async fn test_filters_by_category_and_search() {
    let server = MockServer::start().await;
    seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.app(dir.path()).await;
    let catalog = app.catalog();

    let dairy = catalog
        .products(
            None,
            &CatalogQuery {
                category: Some("DAIRY".to_string()),
                search: None,
            },
        )
        .await
        .unwrap();
    let names: Vec<&str> = dairy.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Greek Yogurt", "Cheddar"]);

    let milk = catalog
        .products(
            None,
            &CatalogQuery {
                category: None,
                search: Some("milk".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(milk.len(), 1);
    assert_eq!(milk[0].name, "Oat Milk");
}

#[tokio::test]
async fn test_featured_and_categories() {
    let server = MockServer::start().await;
    seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.app(dir.path()).await;

    let featured = app.catalog().featured(None).await.unwrap();
    assert_eq!(featured.len(), pantry_core::FEATURED_COUNT);
    assert_eq!(featured[0].name, "Greek Yogurt");

    let categories = app.catalog().categories(None).await.unwrap();
    assert_eq!(
        categories,
        ["bakery", "beverages", "dairy", "pantry", "produce"]
    );
}

#[tokio::test]
async fn test_listing_is_cached() {
    let server = MockServer::start().await;
    seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.app(dir.path()).await;

    let _ = app.catalog().products(None, &CatalogQuery::default()).await.unwrap();
    let _ = app.catalog().featured(None).await.unwrap();
    let _ = app.catalog().categories(None).await.unwrap();

    assert_eq!(server.state().requests(), vec!["GET /api/product".to_string()]);
}

#[tokio::test]
async fn test_missing_product_surfaces_server_message() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = server.app(dir.path()).await;

    let err = app
        .catalog()
        .product(None, &ProductId::new("ghost"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerRejection);
    assert_eq!(err.to_string(), "Product not found");
}

#[tokio::test]
async fn test_listing_failure_is_not_cached() {
    let server = MockServer::start().await;
    seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.app(dir.path()).await;

    server
        .state()
        .fail_next("GET /api/product", StatusCode::BAD_GATEWAY, None);
    let err = app.catalog().featured(None).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch products");

    assert_eq!(app.catalog().featured(None).await.unwrap().len(), 6);
}

// ============================================================================
// Administration
// ============================================================================

#[tokio::test]
async fn test_create_with_image_invalidates_listing() {
    let server = MockServer::start().await;
    seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.shopper(dir.path(), "admin@example.com").await;
    let token = app.auth().token().await.unwrap();

    let before = app.catalog().products(None, &CatalogQuery::default()).await.unwrap();

    let mut new = draft("Pretzels");
    new.image = Some(ImageUpload {
        file_name: "pretzels.png".to_string(),
        content_type: ImageUpload::content_type_for("pretzels.png").to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    });
    let created = app.catalog().create_product(&token, &new).await.unwrap();

    assert_eq!(created.name, "Pretzels");
    assert_eq!(created.price, Price::from_minor(399));
    assert_eq!(created.image, "/uploads/pretzels.png");

    let after = app.catalog().products(None, &CatalogQuery::default()).await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after.last().unwrap().id, created.id);
}

#[tokio::test]
async fn test_update_keeps_unchanged_fields() {
    let server = MockServer::start().await;
    let ids = seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.shopper(dir.path(), "admin@example.com").await;
    let token = app.auth().token().await.unwrap();
    let id = ProductId::new(&ids[2]);

    let existing = app.catalog().product(Some(&token), &id).await.unwrap();
    let mut edit = ProductDraft::from_product(&existing);
    edit.price = Price::from_minor(475);

    let updated = app.catalog().update_product(&token, &id, &edit).await.unwrap();
    assert_eq!(updated.name, "Rye Bread");
    assert_eq!(updated.price, Price::from_minor(475));
    assert_eq!(updated.image, existing.image);

    // The cached detail was dropped by the write.
    let reread = app.catalog().product(None, &id).await.unwrap();
    assert_eq!(reread.price, Price::from_minor(475));
}

#[tokio::test]
async fn test_delete_product() {
    let server = MockServer::start().await;
    let ids = seed(&server);
    let dir = tempfile::tempdir().unwrap();
    let app = server.shopper(dir.path(), "admin@example.com").await;
    let token = app.auth().token().await.unwrap();

    app.catalog()
        .delete_product(&token, &ProductId::new(&ids[0]))
        .await
        .unwrap();

    assert_eq!(server.state().product_count(), 6);
    let listing = app.catalog().products(None, &CatalogQuery::default()).await.unwrap();
    assert!(listing.iter().all(|p| p.id.as_str() != ids[0]));
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_locally() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = server.shopper(dir.path(), "admin@example.com").await;
    let token = app.auth().token().await.unwrap();
    server.state().clear_requests();

    let mut bad = draft("Crackers");
    bad.price = Price::from_minor(0);
    let err = app.catalog().create_product(&token, &bad).await.unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert!(server.state().requests().is_empty());
}

#[tokio::test]
async fn test_write_with_revoked_token_needs_login() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = server.shopper(dir.path(), "admin@example.com").await;
    let token = app.auth().token().await.unwrap();
    server.state().revoke_tokens();

    let err = app
        .catalog()
        .create_product(&token, &draft("Crackers"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthRequired);
    assert_eq!(err.to_string(), "Not authorized, token failed");
}
