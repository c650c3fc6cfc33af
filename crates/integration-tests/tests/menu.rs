//! Menu reads through the cache against the mock backend.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use eathub_client::services::keys;
use eathub_core::{MenuItemId, MenuQuery, Price};
use eathub_integration_tests::{MockBackend, error_body};
use serde_json::{Value, json};

fn menu() -> Value {
    json!([
        {"id": 1, "name": "Margherita", "price": 12.99, "category": "pizza", "isFeatured": true},
        {"id": "2", "name": "Caesar Salad", "price": 8.5, "imageUrl": "/img/salad.png"}
    ])
}

async fn backend() -> MockBackend {
    MockBackend::start(|req, _| match req.path.as_str() {
        "/menu" => (StatusCode::OK, json!({ "data": menu() })),
        "/menu/1" => (StatusCode::OK, menu()[0].clone()),
        "/categories" => (
            StatusCode::OK,
            json!([{"id": "pizza", "name": "Pizza", "itemCount": 1}]),
        ),
        "/menu/announcement" => (StatusCode::OK, json!({ "data": null })),
        _ => (StatusCode::NOT_FOUND, error_body("Not found", "NOT_FOUND")),
    })
    .await
}

#[tokio::test]
async fn test_cached_menu_fetches_once_until_invalidated() {
    let backend = backend().await;
    let hub = backend.client();
    let query = MenuQuery::default();

    let first = hub.menu().get_menu_items_cached(&query).await.unwrap();
    let second = hub.menu().get_menu_items_cached(&query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(backend.hits("GET /menu"), 1);

    hub.cache().invalidate_pattern(keys::MENU);
    hub.menu().get_menu_items_cached(&query).await.unwrap();
    assert_eq!(backend.hits("GET /menu"), 2);
}

#[tokio::test]
async fn test_forced_refresh_always_fetches() {
    let backend = backend().await;
    let hub = backend.client();
    let query = MenuQuery::default();

    hub.menu().get_menu_items(&query).await.unwrap();
    hub.menu().get_menu_items(&query).await.unwrap();
    assert_eq!(backend.hits("GET /menu"), 2);

    // The forced read leaves a fresh entry behind
    hub.menu().get_menu_items_cached(&query).await.unwrap();
    assert_eq!(backend.hits("GET /menu"), 2);
}

#[tokio::test]
async fn test_query_is_sent_and_keyed_separately() {
    let backend = backend().await;
    let hub = backend.client();
    let pizza = MenuQuery {
        category: Some("pizza".to_string()),
        search: None,
    };

    hub.menu().get_menu_items_cached(&pizza).await.unwrap();
    hub.menu()
        .get_menu_items_cached(&MenuQuery::default())
        .await
        .unwrap();

    assert_eq!(backend.hits("GET /menu"), 2);
    let requests = backend.requests();
    assert_eq!(requests[0].query.as_deref(), Some("category=pizza"));
    assert_eq!(requests[1].query, None);
}

#[tokio::test]
async fn test_bare_and_enveloped_bodies_decode_alike() {
    let backend = backend().await;
    let hub = backend.client();

    let item = hub.menu().get_menu_item(&MenuItemId::new("1")).await.unwrap();
    let listed = hub
        .menu()
        .get_menu_items(&MenuQuery::default())
        .await
        .unwrap();

    assert_eq!(item, listed[0]);
    assert!(item.featured);
    assert_eq!(listed[1].price, Price::from_cents(850));
    assert_eq!(listed[1].image.as_deref(), Some("/img/salad.png"));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let backend = backend().await;
    let hub = backend.client();

    let err = hub
        .menu()
        .get_menu_item(&MenuItemId::new("99"))
        .await
        .unwrap_err();

    let api = err.api().unwrap();
    assert!(api.is_not_found());
    assert_eq!(api.code, "NOT_FOUND");
    assert_eq!(backend.hits("GET /menu/99"), 1);
}

#[tokio::test]
async fn test_reads_retry_twice_on_server_errors() {
    let backend = MockBackend::start(|_, hit| {
        if hit <= 2 {
            (StatusCode::SERVICE_UNAVAILABLE, Value::Null)
        } else {
            (StatusCode::OK, json!([{"id": "pizza", "name": "Pizza"}]))
        }
    })
    .await;
    let hub = backend.client();

    let categories = hub.menu().get_categories().await.unwrap();

    assert_eq!(categories.len(), 1);
    assert_eq!(backend.hits("GET /categories"), 3);
}

#[tokio::test]
async fn test_read_gives_up_after_two_retries() {
    let backend =
        MockBackend::start(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, error_body("Boom", "INTERNAL"))).await;
    let hub = backend.client();

    let err = hub.menu().get_featured_items().await.unwrap_err();

    assert_eq!(err.api().unwrap().status, Some(500));
    assert_eq!(err.api().unwrap().message, "Boom");
    assert!(err.is_retryable());
    assert_eq!(backend.hits("GET /menu/featured"), 3);
}

#[tokio::test]
async fn test_missing_announcement_is_inactive() {
    let backend = backend().await;
    let hub = backend.client();

    let announcement = hub.menu().get_announcement().await.unwrap();

    assert!(!announcement.active);
    assert!(announcement.message.is_empty());
}
