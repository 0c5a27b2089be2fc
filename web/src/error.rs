//! Error types for web handlers.
//!
//! [`AppError`] bridges [`CheckoutError`] and HTTP responses. Client errors
//! keep their message; server errors replace it with an operation-level
//! message and log the original.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use indieevent_core::CheckoutError;
use serde::Serialize;
use std::fmt;

/// Message for 5xx errors not tied to a specific operation
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`, rendering `{ "error": ..., "code": ... }`.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Data>, AppError> {
///     let event = state.checkout.lookup_event(&id).await
///         .map_err(|e| AppError::from_checkout(e, "Failed to load event"))?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), code)
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code)
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.into(), code)
    }

    /// Map a checkout failure. `failure_message` replaces the text of any 5xx.
    #[must_use]
    pub fn from_checkout(err: CheckoutError, failure_message: &str) -> Self {
        match &err {
            CheckoutError::InvalidRequest(message) => Self::bad_request(message.clone()),
            CheckoutError::EventNotFound(_) => Self::not_found("Event not found", "EVENT_NOT_FOUND"),
            CheckoutError::SessionNotFound(_) => {
                Self::not_found("Session not found", "SESSION_NOT_FOUND")
            }
            CheckoutError::PaymentIncomplete(_) => Self::conflict(err.to_string(), "PAYMENT_INCOMPLETE"),
            CheckoutError::ProviderError(_) => {
                Self::internal(failure_message, "PROVIDER_ERROR").with_source(err.into())
            }
            CheckoutError::LookupFailed(_) => {
                Self::internal(failure_message, "LOOKUP_FAILED").with_source(err.into())
            }
            CheckoutError::LedgerFailed(_) => {
                Self::internal(failure_message, "LEDGER_FAILED").with_source(err.into())
            }
            CheckoutError::TicketIssueFailed(_) => {
                Self::internal(failure_message, "TICKET_ISSUE_FAILED").with_source(err.into())
            }
        }
    }

    /// HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Human-readable error message.
    error: String,
    /// Error code (for client error handling).
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            error: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(INTERNAL_ERROR_MESSAGE, "INTERNAL_SERVER_ERROR").with_source(err)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        Self::from_checkout(err, INTERNAL_ERROR_MESSAGE)
    }
}
