//! Error types for the Stripe API client

use thiserror::Error;

/// Errors that can occur when interacting with the Stripe API
#[derive(Debug, Error)]
pub enum StripeError {
    /// Missing `STRIPE_SECRET_KEY` environment variable
    #[error("Missing STRIPE_SECRET_KEY environment variable")]
    MissingSecretKey,

    /// HTTP client could not be constructed
    #[error("Client configuration failed: {0}")]
    ClientBuild(String),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The request exceeded the configured client timeout
    #[error("Request timed out")]
    Timeout,

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The requested object does not exist
    #[error("No such resource: {0}")]
    NotFound(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid secret key
    #[error("Unauthorized - invalid secret key")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

impl StripeError {
    /// Map a transport-level `reqwest` error, keeping timeouts distinct.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
