//! HTTP-level checkout tests against the mock wiring.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum_test::TestServer;
use http::{HeaderName, HeaderValue, StatusCode};
use indieevent_core::GatewayError;
use indieevent_testing::{FailingGateway, TestHarness};
use indieevent_web::{AppState, CORRELATION_ID_HEADER, build_router};
use serde_json::{Value, json};
use std::sync::Arc;

struct Api {
    server: TestServer,
    harness_gateway: Arc<indieevent_testing::RecordingGateway>,
}

fn api() -> Api {
    api_with(TestHarness::new())
}

fn api_with(harness: TestHarness) -> Api {
    let harness_gateway = Arc::clone(&harness.gateway);
    let state = AppState::new(harness.service, "http://localhost:3000");
    let server = TestServer::new(build_router(state)).expect("test server should start");
    Api {
        server,
        harness_gateway,
    }
}

async fn create(api: &Api, body: Value) -> Value {
    let response = api.server.post("/api/checkout").json(&body).await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn test_validation_errors_are_400_with_message() {
    let api = api();

    let cases = [
        (json!({ "userId": "user-6", "price": 25 }), "missing eventId"),
        (json!({ "eventId": "event-1", "price": 25 }), "missing userId"),
        (json!({ "eventId": "event-1", "userId": "user-6" }), "missing price"),
        (json!({ "eventId": "event-1", "userId": "user-6", "price": -5 }), "invalid price"),
    ];

    for (body, expected) in cases {
        let response = api.server.post("/api/checkout").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], expected);
    }

    let response = api.server.post("/api/checkout").text("not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "bad body");

    assert_eq!(api.harness_gateway.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_event_is_404() {
    let api = api();

    let response = api
        .server
        .post("/api/checkout")
        .json(&json!({ "eventId": "event-404", "userId": "user-6", "price": 25 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Event not found");
    assert_eq!(api.harness_gateway.create_calls(), 0);
}

#[tokio::test]
async fn test_provider_failure_is_500_without_provider_text() {
    let harness = TestHarness::builder()
        .gateway(Arc::new(FailingGateway::new(GatewayError::Provider(
            "Invalid API Key provided: sk_live_secret".to_string(),
        ))))
        .build();
    let api = api_with(harness);

    let response = api
        .server
        .post("/api/checkout")
        .json(&json!({ "eventId": "event-1", "userId": "user-6", "price": 25 }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let raw = response.text();
    assert!(!raw.contains("sk_live"));
    assert!(!raw.contains("API Key"));
    let body: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(body["error"], "Failed to create checkout session");
    assert_eq!(body["code"], "PROVIDER_ERROR");
    assert_eq!(api.harness_gateway.create_calls(), 1);
}

#[tokio::test]
async fn test_mock_checkout_returns_session_and_success_url() {
    let api = api();

    let body = create(&api, json!({ "eventId": "event-1", "userId": "user-6", "price": 25 })).await;

    assert_eq!(body["success"], true);
    let session_id = body["sessionId"].as_str().unwrap();
    assert!(session_id.starts_with("mock_session_"));
    assert_eq!(
        body["url"],
        format!("/events/event-1/purchase/success?session_id={session_id}")
    );
}

#[tokio::test]
async fn test_guest_checkout_is_accepted() {
    let api = api();

    let body = create(&api, json!({ "eventId": "event-3", "userId": "guest", "price": 35 })).await;

    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_verify_requires_session_id() {
    let api = api();

    let response = api.server.get("/api/checkout/verify").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "missing session_id");
    assert_eq!(api.harness_gateway.total_calls(), 0);
}

#[tokio::test]
async fn test_create_verify_confirm_end_to_end() {
    let api = api();

    let created = create(&api, json!({ "eventId": "event-2", "userId": "user-6", "price": 50 })).await;
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let response = api
        .server
        .get("/api/checkout/verify")
        .add_query_param("session_id", &session_id)
        .await;
    response.assert_status_ok();
    let verified = response.json::<Value>();
    assert_eq!(verified["success"], true);
    assert_eq!(verified["status"], "complete");
    assert_eq!(verified["eventId"], "event-2");
    assert_eq!(verified["userId"], "user-6");
    assert_eq!(verified["amount"], 5000);

    let first = api
        .server
        .post("/api/checkout/confirm")
        .json(&json!({ "sessionId": session_id }))
        .await;
    first.assert_status_ok();
    let first = first.json::<Value>();
    assert_eq!(first["ticket"]["eventId"], "event-2");
    assert_eq!(first["ticket"]["price"], 50.0);
    assert_eq!(first["ticket"]["status"], "confirmed");

    let second = api
        .server
        .post("/api/checkout/confirm")
        .json(&json!({ "sessionId": session_id }))
        .await
        .json::<Value>();
    assert_eq!(first["ticket"]["id"], second["ticket"]["id"]);
}

#[tokio::test]
async fn test_confirm_requires_session_id() {
    let api = api();

    let response = api.server.post("/api/checkout/confirm").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "missing sessionId");

    let response = api.server.post("/api/checkout/confirm").text("{").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "bad body");
}

#[tokio::test]
async fn test_get_event() {
    let api = api();

    let response = api.server.get("/api/events/event-5").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["title"], "Business Model Innovation");
    assert_eq!(body["price"], 30.0);

    api.server
        .get("/api/events/event-404")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let api = api();

    let health = api.server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "ok");

    let ready = api.server.get("/ready").await.json::<Value>();
    assert_eq!(ready["ready"], true);
    assert_eq!(ready["payments"], "mock");
    assert_eq!(ready["events"], "mock");
    assert_eq!(ready["ledger"], "memory");
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let api = api();
    let id = "3f2b8c1e-6d4a-4b7e-9c0f-1a2b3c4d5e6f";

    let response = api
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.header(CORRELATION_ID_HEADER), id);
}
