//! Error types for the backing-store REST client

use thiserror::Error;

/// Errors that can occur when talking to the backing store
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// `SUPABASE_URL` or an API key is not configured
    #[error("Backing store not configured: {0}")]
    NotConfigured(&'static str),

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

    /// PostgREST returned an error
    #[error("Query failed (status {status}): {message}")]
    QueryFailed {
        /// HTTP status code
        status: u16,
        /// Error message from PostgREST
        message: String,
    },
}

impl SupabaseError {
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
