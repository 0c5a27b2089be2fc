//! Live-mode checkout against a `wiremock` stand-in for the Stripe API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use indieevent_core::{CheckoutError, GatewayMode, Money, SessionStatus, StripeGateway};
use indieevent_stripe::StripeClient;
use indieevent_testing::{TEST_ORIGIN, TestHarness, checkout_request};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn live_harness(server: &MockServer) -> TestHarness {
    let client = StripeClient::new("sk_test_abc".to_string(), Duration::from_secs(2))
        .expect("client should build")
        .with_api_url(format!("{}/v1", server.uri()));

    TestHarness::builder()
        .gateway(Arc::new(StripeGateway::new(client, "usd")))
        .build()
}

fn session_body(id: &str, status: &str, metadata: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "status": status,
        "url": null,
        "amount_total": 5000,
        "currency": "usd",
        "payment_status": if status == "complete" { "paid" } else { "unpaid" },
        "metadata": metadata
    })
}

#[tokio::test]
async fn test_live_session_carries_metadata_and_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("unit_amount%5D=5000"))
        .and(body_string_contains("metadata%5BplatformFee%5D=3.50"))
        .and(body_string_contains("metadata%5BhostRevenue%5D=46.50"))
        .and(body_string_contains("events%2Fevent-2%2Fpurchase%2Fsuccess"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_live",
            "status": "open",
            "url": "https://checkout.stripe.com/c/pay/cs_test_live",
            "amount_total": 5000,
            "metadata": { "eventId": "event-2", "userId": "user-6" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = live_harness(&server);
    let result = harness
        .service
        .create_session(checkout_request("event-2", "user-6", 50), TEST_ORIGIN)
        .await
        .unwrap();

    assert_eq!(result.session_id.as_str(), "cs_test_live");
    assert_eq!(result.redirect_url, "https://checkout.stripe.com/c/pay/cs_test_live");

    let record = harness.ledger_record(&result.session_id).await;
    assert_eq!(record.mode, GatewayMode::Live);
}

#[tokio::test]
async fn test_live_verify_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(
            "cs_test_paid",
            "complete",
            json!({ "eventId": "event-2", "userId": "user-6" }),
        )))
        .expect(2)
        .mount(&server)
        .await;

    let harness = live_harness(&server);
    let first = harness.service.verify_session("cs_test_paid").await.unwrap();
    let second = harness.service.verify_session("cs_test_paid").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.status, SessionStatus::Complete);
    assert_eq!(first.amount, Some(Money::from_cents(5000)));
    assert_eq!(first.event_id.unwrap().as_str(), "event-2");
}

#[tokio::test]
async fn test_live_missing_session_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "resource_missing",
                "message": "No such checkout.session: 'cs_test_gone'"
            }
        })))
        .mount(&server)
        .await;

    let harness = live_harness(&server);
    let err = harness.service.verify_session("cs_test_gone").await.unwrap_err();

    assert!(matches!(err, CheckoutError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_ledger_fills_missing_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_bare",
            "status": "open",
            "url": "https://checkout.stripe.com/c/pay/cs_test_bare"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_bare",
            "status": "open"
        })))
        .mount(&server)
        .await;

    let harness = live_harness(&server);
    harness
        .service
        .create_session(checkout_request("event-1", "user-6", 25), TEST_ORIGIN)
        .await
        .unwrap();

    let verified = harness.service.verify_session("cs_test_bare").await.unwrap();

    assert_eq!(verified.status, SessionStatus::Open);
    assert_eq!(verified.event_id.unwrap().as_str(), "event-1");
    assert_eq!(verified.user_id.unwrap().as_str(), "user-6");
    assert_eq!(verified.amount, Some(Money::from_cents(2500)));
}

#[tokio::test]
async fn test_confirm_unpaid_session_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(
            "cs_test_open",
            "open",
            json!({ "eventId": "event-2", "userId": "user-6" }),
        )))
        .mount(&server)
        .await;

    let harness = live_harness(&server);
    let err = harness.service.confirm_purchase("cs_test_open").await.unwrap_err();

    assert_eq!(err, CheckoutError::PaymentIncomplete(SessionStatus::Open));
    assert!(harness.tickets.issued().await.is_empty());
}

#[tokio::test]
async fn test_create_without_payment_url_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_nourl",
            "status": "open"
        })))
        .mount(&server)
        .await;

    let harness = live_harness(&server);
    let err = harness
        .service
        .create_session(checkout_request("event-1", "user-6", 25), TEST_ORIGIN)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::ProviderError(_)));
    assert!(harness.ledger.is_empty().await);
}
