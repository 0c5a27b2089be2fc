//! Health check endpoints.
//!
//! Used by load balancers and monitoring systems to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

/// Liveness response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Readiness response: which backend serves each concern.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Always `true` once the router is serving
    pub ready: bool,
    /// `live` or `mock`
    pub payments: String,
    /// `live` or `mock`
    pub events: String,
    /// Ledger backend
    pub ledger: String,
    /// Ticket issuer backend
    pub tickets: String,
}

/// Liveness check. Does not touch any dependency.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check, reporting mock versus live wiring.
///
/// ```text
/// GET /ready
/// ```
#[allow(clippy::unused_async)]
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let backends = state.checkout.backends();

    Json(ReadinessResponse {
        ready: true,
        payments: backends.payments.as_str().to_string(),
        events: data_mode(backends.events).to_string(),
        ledger: backends.ledger.to_string(),
        tickets: backends.tickets.to_string(),
    })
}

fn data_mode(backend: &str) -> &'static str {
    if backend == "memory" {
        "mock"
    } else {
        "live"
    }
}
