//! Router construction.

use crate::handlers;
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// ```text
/// GET  /health
/// GET  /ready
/// POST /api/checkout
/// GET  /api/checkout/verify?session_id=
/// POST /api/checkout/confirm
/// GET  /api/events/:id
/// ```
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/checkout/verify", get(handlers::verify_checkout))
        .route("/checkout/confirm", post(handlers::confirm_checkout))
        .route("/events/:id", get(handlers::get_event));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(correlation_id_layer())
}
