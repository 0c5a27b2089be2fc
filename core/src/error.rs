//! Error taxonomy for the checkout flow.
//!
//! Seam-level errors ([`LookupError`], [`GatewayError`], [`LedgerError`],
//! [`TicketIssueError`]) are raised by the implementations behind each trait.
//! [`CheckoutService`](crate::service::CheckoutService) normalizes them into
//! [`CheckoutError`], which is what the HTTP layer maps to status codes.

use crate::types::{EventId, SessionId, SessionStatus};
use thiserror::Error;

/// Outcome of a failed checkout operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Client error detected locally; never reaches the provider (400)
    #[error("{0}")]
    InvalidRequest(String),

    /// No event with that id (404)
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The provider has no session with that id (404)
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Payment provider failed or timed out (500)
    #[error("Payment provider error: {0}")]
    ProviderError(String),

    /// Backing store failed while looking up an event (500)
    #[error("Event lookup failed: {0}")]
    LookupFailed(String),

    /// Local checkout ledger failed (500)
    #[error("Checkout ledger error: {0}")]
    LedgerFailed(String),

    /// Ticket could not be issued (500)
    #[error("Ticket issue failed: {0}")]
    TicketIssueFailed(String),

    /// A ticket was requested for a session that is not paid (409)
    #[error("Payment not complete (status: {0})")]
    PaymentIncomplete(SessionStatus),
}

impl CheckoutError {
    /// Shorthand for [`CheckoutError::InvalidRequest`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Whether the error was caused by the caller rather than an upstream.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::EventNotFound(_)
                | Self::SessionNotFound(_)
                | Self::PaymentIncomplete(_)
        )
    }
}

/// Event lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No such event
    #[error("event not found")]
    NotFound,

    /// Storage or transport failure
    #[error("lookup failed: {0}")]
    Failed(String),
}

/// Payment gateway failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The provider does not know the session
    #[error("session not found")]
    SessionNotFound,

    /// The call exceeded the client-side timeout
    #[error("payment provider timed out")]
    Timeout,

    /// Any other provider failure, with the provider's message
    #[error("{0}")]
    Provider(String),
}

/// Checkout ledger failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Stored data could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Ticket issuer failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TicketIssueError(pub String);

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::SessionNotFound => {
                Self::ProviderError("session not found".to_string())
            }
            GatewayError::Timeout => Self::ProviderError("payment provider timed out".to_string()),
            GatewayError::Provider(message) => Self::ProviderError(message),
        }
    }
}

impl From<LedgerError> for CheckoutError {
    fn from(err: LedgerError) -> Self {
        Self::LedgerFailed(err.to_string())
    }
}

impl From<TicketIssueError> for CheckoutError {
    fn from(err: TicketIssueError) -> Self {
        Self::TicketIssueFailed(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_displays_bare_message() {
        assert_eq!(CheckoutError::invalid("missing eventId").to_string(), "missing eventId");
    }

    #[test]
    fn test_timeout_normalizes_to_provider_error() {
        let err: CheckoutError = GatewayError::Timeout.into();
        assert!(matches!(err, CheckoutError::ProviderError(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CheckoutError::invalid("bad body").is_client_error());
        assert!(CheckoutError::PaymentIncomplete(SessionStatus::Open).is_client_error());
        assert!(!CheckoutError::LookupFailed("down".to_string()).is_client_error());
    }
}
