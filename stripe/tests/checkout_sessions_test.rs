//! Checkout Session client tests against a local `wiremock` server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use indieevent_stripe::{
    CheckoutSessionStatus, CreateCheckoutSession, LineItem, StripeClient, StripeError,
};
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, timeout: Duration) -> StripeClient {
    StripeClient::new("sk_test_abc".to_string(), timeout)
        .expect("client should build")
        .with_api_url(format!("{}/v1", server.uri()))
}

fn ticket_params() -> CreateCheckoutSession {
    let mut metadata = BTreeMap::new();
    metadata.insert("eventId".to_string(), "event-2".to_string());
    metadata.insert("userId".to_string(), "user-6".to_string());

    CreateCheckoutSession::new(
        vec![LineItem {
            currency: "usd".to_string(),
            name: "Digital Marketing Masterclass".to_string(),
            description: Some("Ticket for Digital Marketing Masterclass".to_string()),
            unit_amount: 5000,
            quantity: 1,
        }],
        "http://localhost:3000/events/event-2/purchase/success?session_id={CHECKOUT_SESSION_ID}"
            .to_string(),
        "http://localhost:3000/events/event-2".to_string(),
        metadata,
    )
}

#[tokio::test]
async fn test_create_session_posts_form_and_parses_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_abc"))
        .and(header("stripe-version", "2023-10-16"))
        .and(body_string_contains("unit_amount%5D=5000"))
        .and(body_string_contains("metadata%5BeventId%5D=event-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_42",
            "status": "open",
            "url": "https://checkout.stripe.com/c/pay/cs_test_42",
            "amount_total": 5000,
            "currency": "usd",
            "metadata": { "eventId": "event-2", "userId": "user-6" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client_for(&server, Duration::from_secs(5))
        .create_checkout_session(&ticket_params())
        .await
        .unwrap();

    assert_eq!(session.id, "cs_test_42");
    assert_eq!(session.status, Some(CheckoutSessionStatus::Open));
    assert_eq!(session.amount_total, Some(5000));
    assert_eq!(
        session.url.as_deref(),
        Some("https://checkout.stripe.com/c/pay/cs_test_42")
    );
}

#[tokio::test]
async fn test_retrieve_missing_session_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "code": "resource_missing",
                "message": "No such checkout.session: 'cs_missing'",
                "type": "invalid_request_error"
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, Duration::from_secs(5))
        .retrieve_checkout_session("cs_missing")
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::NotFound(ref msg) if msg.contains("cs_missing")));
}

#[tokio::test]
async fn test_retrieve_complete_session_reads_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_paid",
            "status": "complete",
            "url": null,
            "amount_total": 3500,
            "payment_status": "paid",
            "metadata": { "eventId": "event-3", "userId": "user-2" }
        })))
        .mount(&server)
        .await;

    let session = client_for(&server, Duration::from_secs(5))
        .retrieve_checkout_session("cs_paid")
        .await
        .unwrap();

    assert_eq!(session.status, Some(CheckoutSessionStatus::Complete));
    assert_eq!(session.url, None);
    assert_eq!(session.metadata.get("eventId").map(String::as_str), Some("event-3"));
}

#[tokio::test]
async fn test_server_error_carries_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "message": "Invalid currency: zzz", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, Duration::from_secs(5))
        .create_checkout_session(&ticket_params())
        .await
        .unwrap_err();

    match err {
        StripeError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid currency: zzz");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server, Duration::from_secs(5))
        .retrieve_checkout_session("cs_any")
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::Unauthorized));
}

#[tokio::test]
async fn test_slow_provider_surfaces_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": "cs_slow" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, Duration::from_millis(50))
        .retrieve_checkout_session("cs_slow")
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::Timeout));
}
