//! Checkout and order tracking.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use eathub_client::services::keys;
use eathub_client::{CheckoutOptions, Error};
use eathub_core::{CustomerDetails, NewCartItem, OrderNumber, OrderStatus, Price};
use eathub_integration_tests::{MockBackend, error_body};
use serde_json::{Value, json};

fn placed_order() -> Value {
    json!({
        "success": true,
        "data": {
            "orderNumber": "EH-1001",
            "items": [{"menuItemId": "1", "name": "Margherita", "price": 12.99, "quantity": 2}],
            "total": 25.98,
            "status": "pending"
        }
    })
}

fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Ana".to_string(),
        phone: "555-0100".to_string(),
        ..CustomerDetails::default()
    }
}

fn pizza() -> NewCartItem {
    NewCartItem {
        id: "1".into(),
        name: "Margherita".to_string(),
        price: Price::from_cents(1299),
        image: None,
        quantity: Some(2),
    }
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let backend = MockBackend::start(|_, _| (StatusCode::CREATED, placed_order())).await;
    let hub = backend.client();
    hub.cart().add_item(pizza());

    let order = hub.checkout(customer(), CheckoutOptions::default()).await.unwrap();

    assert_eq!(order.order_number.as_str(), "EH-1001");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(hub.cart().item_count(), 0);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].body["items"][0]["menuItemId"], "1");
    assert_eq!(requests[0].body["items"][0]["quantity"], 2);
    assert_eq!(requests[0].body["customer"]["name"], "Ana");
}

#[tokio::test]
async fn test_failed_order_is_not_retried_and_keeps_cart() {
    let backend = MockBackend::start(|_, _| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Kitchen offline", "INTERNAL"),
        )
    })
    .await;
    let hub = backend.client();
    hub.cart().add_item(pizza());

    let err = hub
        .checkout(customer(), CheckoutOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.api().unwrap().message, "Kitchen offline");
    assert_eq!(backend.hits("POST /orders"), 1);
    assert_eq!(hub.cart().item_count(), 2);
}

#[tokio::test]
async fn test_invalid_order_never_reaches_backend() {
    let backend = MockBackend::start(|_, _| (StatusCode::CREATED, placed_order())).await;
    let hub = backend.client();
    hub.cart().add_item(pizza());

    let err = hub
        .checkout(CustomerDetails::default(), CheckoutOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_order_drops_rewards_cache() {
    let backend = MockBackend::start(|req, _| match req.path.as_str() {
        "/orders" => (StatusCode::CREATED, placed_order()),
        _ => (StatusCode::OK, json!({"points": 10})),
    })
    .await;
    let hub = backend.client();

    hub.rewards().get_rewards_status().await.unwrap();
    assert!(hub.cache().get::<Value>(keys::REWARDS_STATUS).is_some());

    hub.cart().add_item(pizza());
    hub.checkout(customer(), CheckoutOptions::default()).await.unwrap();
    assert!(hub.cache().get::<Value>(keys::REWARDS_STATUS).is_none());

    hub.rewards().get_rewards_status().await.unwrap();
    assert_eq!(backend.hits("GET /rewards/status"), 2);
}

#[tokio::test]
async fn test_tracking_retries_transient_failure() {
    let backend = MockBackend::start(|_, hit| {
        if hit == 1 {
            (StatusCode::SERVICE_UNAVAILABLE, Value::Null)
        } else {
            let mut body = placed_order()["data"].clone();
            body["status"] = json!("preparing");
            (StatusCode::OK, body)
        }
    })
    .await;
    let hub = backend.client();

    let order = hub
        .orders()
        .get_order(&OrderNumber::new("EH-1001"))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Preparing);
    assert_eq!(backend.hits("GET /orders/EH-1001"), 2);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let backend =
        MockBackend::start(|_, _| (StatusCode::NOT_FOUND, error_body("Order not found", "NOT_FOUND")))
            .await;
    let hub = backend.client();

    let err = hub
        .orders()
        .get_order(&OrderNumber::new("EH-404"))
        .await
        .unwrap_err();

    assert!(err.api().unwrap().is_not_found());
    assert_eq!(backend.hits("GET /orders/EH-404"), 1);
}
