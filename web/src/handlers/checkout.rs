//! Checkout API endpoints.
//!
//! - POST /api/checkout - Start a hosted checkout for one event ticket
//! - GET /api/checkout/verify?session_id= - Read back a session's outcome
//! - POST /api/checkout/confirm - Issue the ticket for a paid session
//!
//! # Flow
//!
//! 1. **Create**: the browser posts `{eventId, userId, price}` and is sent to
//!    the returned `url` (the provider's payment page, or straight to the
//!    success page in mock mode)
//! 2. **Verify**: the success page reads `session_id` from its query string
//!    and asks for the session's status and metadata
//! 3. **Confirm**: once the status is `complete`, the page confirms and gets
//!    the ticket. Repeating the call returns the same ticket.

#![allow(clippy::missing_errors_doc)]

use crate::error::AppError;
use crate::extractors::{CorrelationId, RequestOrigin};
use crate::middleware::record_checkout_fields;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use indieevent_core::{CheckoutError, CheckoutRequest, SessionStatus, Ticket, TicketStatus};
use serde::{Deserialize, Serialize};

/// Message for any 5xx from session creation
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create checkout session";
/// Message for any 5xx from session verification
pub const VERIFY_FAILED_MESSAGE: &str = "Failed to verify checkout session";
/// Message for any 5xx from purchase confirmation
pub const CONFIRM_FAILED_MESSAGE: &str = "Failed to confirm purchase";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response after creating a checkout session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    /// Always `true`
    pub success: bool,
    /// Provider session id
    pub session_id: String,
    /// Where to send the browser
    pub url: String,
}

/// Query string for verification.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Session to verify
    pub session_id: Option<String>,
}

/// Response after verifying a checkout session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCheckoutResponse {
    /// Always `true`
    pub success: bool,
    /// Session status
    pub status: SessionStatus,
    /// Event the session was for, if known
    pub event_id: Option<String>,
    /// Buyer, if known
    pub user_id: Option<String>,
    /// Amount charged, in cents
    pub amount: Option<u64>,
}

/// Request to confirm a purchase.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPurchaseRequest {
    /// Session to confirm
    pub session_id: Option<String>,
}

/// Ticket as returned to the browser.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    /// Ticket id
    pub id: String,
    /// Event id
    pub event_id: String,
    /// Holder
    pub user_id: String,
    /// Price paid, in dollars
    pub price: f64,
    /// When the ticket was issued
    pub purchased_at: DateTime<Utc>,
    /// Ticket status
    pub status: TicketStatus,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id.into_inner(),
            event_id: ticket.event_id.into_inner(),
            user_id: ticket.user_id.into_inner(),
            price: ticket.price.as_dollars(),
            purchased_at: ticket.purchased_at,
            status: ticket.status,
        }
    }
}

/// Response after confirming a purchase.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmPurchaseResponse {
    /// Always `true`
    pub success: bool,
    /// The session's ticket
    pub ticket: TicketResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a checkout session.
///
/// # Endpoint
///
/// ```text
/// POST /api/checkout
/// Content-Type: application/json
///
/// { "eventId": "event-1", "userId": "user-6", "price": 25 }
/// ```
///
/// # Response
///
/// - 200 `{ "success": true, "sessionId": "...", "url": "..." }`
/// - 400 validation failure, e.g. `{ "error": "missing eventId" }`
/// - 404 unknown event
/// - 500 `{ "error": "Failed to create checkout session" }`
///
/// The body is read raw so malformed JSON gets the same `{error}` shape as
/// every other validation failure.
pub async fn create_checkout(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequestOrigin(origin): RequestOrigin,
    body: Bytes,
) -> Result<Json<CreateCheckoutResponse>, AppError> {
    let request = CheckoutRequest::from_json_slice(&body)
        .map_err(|e| AppError::from_checkout(e, CREATE_FAILED_MESSAGE))?;
    record_checkout_fields(Some(request.event_id.as_str()), None);

    tracing::info!(
        correlation_id = %correlation_id.0,
        event_id = %request.event_id,
        user_id = %request.user_id,
        "Creating checkout session"
    );

    let session = state
        .checkout
        .create_session(request, &origin)
        .await
        .map_err(|e| AppError::from_checkout(e, CREATE_FAILED_MESSAGE))?;
    record_checkout_fields(None, Some(session.session_id.as_str()));

    Ok(Json(CreateCheckoutResponse {
        success: true,
        session_id: session.session_id.into_inner(),
        url: session.redirect_url,
    }))
}

/// Verify a checkout session.
///
/// # Endpoint
///
/// ```text
/// GET /api/checkout/verify?session_id=cs_test_123
/// ```
///
/// # Response
///
/// - 200 `{ "success": true, "status": "complete", "eventId": "...", "userId": "...", "amount": 2500 }`
/// - 400 `{ "error": "missing session_id" }`
/// - 404 unknown session
/// - 500 `{ "error": "Failed to verify checkout session" }`
///
/// Read-only: calling it repeatedly changes nothing.
pub async fn verify_checkout(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyCheckoutResponse>, AppError> {
    let session_id = query.session_id.unwrap_or_default();

    let verified = state
        .checkout
        .verify_session(&session_id)
        .await
        .map_err(|e| AppError::from_checkout(e, VERIFY_FAILED_MESSAGE))?;

    Ok(Json(VerifyCheckoutResponse {
        success: true,
        status: verified.status,
        event_id: verified.event_id.map(indieevent_core::EventId::into_inner),
        user_id: verified.user_id.map(indieevent_core::UserId::into_inner),
        amount: verified.amount.map(|amount| amount.cents()),
    }))
}

/// Confirm a paid session and return its ticket.
///
/// # Endpoint
///
/// ```text
/// POST /api/checkout/confirm
///
/// { "sessionId": "cs_test_123" }
/// ```
///
/// # Response
///
/// - 200 `{ "success": true, "ticket": { ... } }`
/// - 400 bad body or missing `sessionId`
/// - 404 unknown session
/// - 409 session not paid yet
/// - 500 `{ "error": "Failed to confirm purchase" }`
pub async fn confirm_checkout(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Bytes,
) -> Result<Json<ConfirmPurchaseResponse>, AppError> {
    let request: ConfirmPurchaseRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::from(CheckoutError::invalid("bad body")))?;
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("missing sessionId"))?;
    record_checkout_fields(None, Some(&session_id));

    tracing::info!(
        correlation_id = %correlation_id.0,
        session_id = %session_id,
        "Confirming purchase"
    );

    let ticket = state
        .checkout
        .confirm_purchase(&session_id)
        .await
        .map_err(|e| AppError::from_checkout(e, CONFIRM_FAILED_MESSAGE))?;
    record_checkout_fields(Some(ticket.event_id.as_str()), None);

    Ok(Json(ConfirmPurchaseResponse {
        success: true,
        ticket: ticket.into(),
    }))
}
