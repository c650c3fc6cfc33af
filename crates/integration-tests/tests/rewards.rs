//! Rewards and vouchers.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use eathub_core::{Price, RewardId};
use eathub_integration_tests::{MockBackend, error_body};
use serde_json::{Value, json};

fn redemption() -> Value {
    json!({"data": {"rewardId": "free-drink", "pointsSpent": 100, "remainingPoints": 20}})
}

#[tokio::test]
async fn test_signed_out_rewards_are_not_cached() {
    let backend =
        MockBackend::start(|_, _| (StatusCode::UNAUTHORIZED, error_body("No token", "UNAUTHORIZED")))
            .await;
    let hub = backend.client();

    let first = hub.rewards().get_rewards_status().await.unwrap();
    let second = hub.rewards().get_rewards_status().await.unwrap();

    assert!(!first.enrolled);
    assert_eq!(first.points, 0);
    assert_eq!(first, second);
    // 401 is not retried, and the placeholder is not cached
    assert_eq!(backend.hits("GET /rewards/status"), 2);
}

#[tokio::test]
async fn test_rewards_status_is_cached() {
    let backend = MockBackend::start(|_, _| {
        (
            StatusCode::OK,
            json!({"points": 150, "rewards": [{"id": 1, "name": "Free drink", "points": 100}]}),
        )
    })
    .await;
    let hub = backend.client();

    let status = hub.rewards().get_rewards_status().await.unwrap();
    hub.rewards().get_rewards_status().await.unwrap();

    assert!(status.enrolled);
    assert_eq!(status.affordable().count(), 1);
    assert_eq!(backend.hits("GET /rewards/status"), 1);
}

#[tokio::test]
async fn test_redeem_retries_once_with_same_idempotency_key() {
    let backend = MockBackend::start(|_, hit| {
        if hit == 1 {
            (StatusCode::BAD_GATEWAY, Value::Null)
        } else {
            (StatusCode::OK, redemption())
        }
    })
    .await;
    let hub = backend.client();

    let redeemed = hub
        .rewards()
        .redeem_reward(&RewardId::new("free-drink"), 100)
        .await
        .unwrap();

    assert_eq!(redeemed.remaining_points, 20);
    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    let key = requests[0].idempotency_key.clone().unwrap();
    assert!(!key.is_empty());
    assert_eq!(requests[1].idempotency_key.as_deref(), Some(key.as_str()));
    assert_eq!(requests[0].body["rewardId"], "free-drink");
    assert_eq!(requests[0].body["points"], 100);
}

#[tokio::test]
async fn test_redeem_gives_up_after_one_retry() {
    let backend = MockBackend::start(|_, _| (StatusCode::SERVICE_UNAVAILABLE, Value::Null)).await;
    let hub = backend.client();

    let err = hub
        .rewards()
        .redeem_reward(&RewardId::new("free-drink"), 100)
        .await
        .unwrap_err();

    assert_eq!(err.api().unwrap().status, Some(503));
    assert_eq!(backend.hits("POST /rewards/redeem"), 2);
}

#[tokio::test]
async fn test_redeem_rejection_is_not_retried() {
    let backend = MockBackend::start(|_, _| {
        (
            StatusCode::BAD_REQUEST,
            error_body("Not enough points", "INSUFFICIENT_POINTS"),
        )
    })
    .await;
    let hub = backend.client();

    let err = hub
        .rewards()
        .redeem_reward(&RewardId::new("free-drink"), 100)
        .await
        .unwrap_err();

    assert_eq!(err.api().unwrap().code, "INSUFFICIENT_POINTS");
    assert_eq!(backend.hits("POST /rewards/redeem"), 1);
}

#[tokio::test]
async fn test_redeem_refreshes_rewards_status() {
    let backend = MockBackend::start(|req, _| match req.path.as_str() {
        "/rewards/redeem" => (StatusCode::OK, redemption()),
        _ => (StatusCode::OK, json!({"points": 120})),
    })
    .await;
    let hub = backend.client();

    hub.rewards().get_rewards_status().await.unwrap();
    hub.rewards()
        .redeem_reward(&RewardId::new("free-drink"), 100)
        .await
        .unwrap();
    hub.rewards().get_rewards_status().await.unwrap();

    assert_eq!(backend.hits("GET /rewards/status"), 2);
}

#[tokio::test]
async fn test_signed_out_vouchers_are_empty() {
    let backend =
        MockBackend::start(|_, _| (StatusCode::FORBIDDEN, error_body("Forbidden", "FORBIDDEN"))).await;
    let hub = backend.client();

    let vouchers = hub.vouchers().get_available_vouchers().await.unwrap();

    assert!(vouchers.is_empty());
    assert_eq!(backend.hits("GET /vouchers/available"), 1);
}

#[tokio::test]
async fn test_available_vouchers_decode() {
    let backend = MockBackend::start(|_, _| {
        (
            StatusCode::OK,
            json!({"data": [{
                "id": "v1",
                "code": "WELCOME10",
                "discount": {"type": "percentage", "value": 10},
                "minOrderAmount": 20
            }]}),
        )
    })
    .await;
    let hub = backend.client();

    let vouchers = hub.vouchers().get_available_vouchers().await.unwrap();

    assert_eq!(vouchers.len(), 1);
    assert_eq!(vouchers[0].code, "WELCOME10");
    assert_eq!(vouchers[0].min_order, Some(Price::from_cents(2000)));
    assert_eq!(
        vouchers[0].discount.amount_for(Price::from_cents(5000)),
        Price::from_cents(500)
    );
}

#[tokio::test]
async fn test_invalid_voucher_is_not_retried() {
    let backend = MockBackend::start(|_, _| {
        (
            StatusCode::BAD_REQUEST,
            error_body("Voucher has expired", "VOUCHER_EXPIRED"),
        )
    })
    .await;
    let hub = backend.client();

    let err = hub
        .vouchers()
        .validate_voucher("OLD5", Price::from_cents(2500))
        .await
        .unwrap_err();

    let api = err.api().unwrap();
    assert_eq!(api.code, "VOUCHER_EXPIRED");
    assert_eq!(api.message, "Voucher has expired");
    assert!(api.is_client_error());
    assert_eq!(backend.hits("POST /vouchers/validate"), 1);
    assert_eq!(backend.requests()[0].body["code"], "OLD5");
}

#[tokio::test]
async fn test_valid_voucher() {
    let backend = MockBackend::start(|_, _| {
        (
            StatusCode::OK,
            json!({"valid": true, "code": "WELCOME10", "discount": 2.5}),
        )
    })
    .await;
    let hub = backend.client();

    let validation = hub
        .vouchers()
        .validate_voucher(" WELCOME10 ", Price::from_cents(2500))
        .await
        .unwrap();

    assert!(validation.valid);
    assert_eq!(validation.discount_amount, Some(Price::from_cents(250)));
    assert_eq!(backend.requests()[0].body["code"], "WELCOME10");
}
