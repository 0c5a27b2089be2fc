//! Event lookup endpoint.
//!
//! - GET /api/events/:id - Title and price of one event

#![allow(clippy::missing_errors_doc)]

use crate::error::AppError;
use crate::middleware::record_checkout_fields;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use indieevent_core::Event;
use serde::{Deserialize, Serialize};

/// Message for any 5xx from event lookup
pub const LOOKUP_FAILED_MESSAGE: &str = "Failed to load event";

/// Event as shown on the purchase page.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Event id
    pub id: String,
    /// Display title
    pub title: String,
    /// Ticket price in dollars
    pub price: f64,
    /// Host, if recorded
    pub host_id: Option<String>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            title: event.display_title().to_string(),
            price: event.price.as_dollars(),
            host_id: event.host_id.map(indieevent_core::UserId::into_inner),
            id: event.id.into_inner(),
        }
    }
}

/// Get an event.
///
/// # Endpoint
///
/// ```text
/// GET /api/events/:id
/// ```
///
/// # Response
///
/// - 200 `{ "id": "event-1", "title": "...", "price": 25.0, "hostId": "..." }`
/// - 404 unknown event
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, AppError> {
    record_checkout_fields(Some(&id), None);
    let event = state
        .checkout
        .lookup_event(&id)
        .await
        .map_err(|e| AppError::from_checkout(e, LOOKUP_FAILED_MESSAGE))?;

    Ok(Json(event.into()))
}
