//! Stripe API client implementation

use crate::{
    checkout::{CheckoutSession, CreateCheckoutSession, ErrorEnvelope},
    error::StripeError,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.stripe.com/v1";

/// API version pinned for every request
pub const API_VERSION: &str = "2023-10-16";

/// Default client-side timeout for a single API call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    api_url: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new client with the secret key from the environment
    ///
    /// # Errors
    ///
    /// Returns `StripeError::MissingSecretKey` if `STRIPE_SECRET_KEY` is not set
    pub fn from_env() -> Result<Self, StripeError> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(StripeError::MissingSecretKey)?;

        Self::new(secret_key, DEFAULT_TIMEOUT)
    }

    /// Create a new client with an explicit secret key and request timeout
    ///
    /// # Errors
    ///
    /// Returns `StripeError::ClientBuild` if the TLS backend cannot be initialised
    pub fn new(secret_key: String, timeout: Duration) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StripeError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            secret_key,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Point the client at a different API base URL (test servers, proxies)
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The API base URL in use
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Create a hosted checkout session
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, timeouts, API errors, or parsing failures
    pub async fn create_checkout_session(
        &self,
        params: &CreateCheckoutSession,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_url))
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", API_VERSION)
            .form(&params.to_form())
            .send()
            .await
            .map_err(|e| StripeError::from_transport(&e))?;

        Self::parse_response(response).await
    }

    /// Retrieve a checkout session by id
    ///
    /// # Errors
    ///
    /// Returns `StripeError::NotFound` if the session does not exist, and the
    /// usual transport/API errors otherwise
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let mut url = Url::parse(&format!("{}/checkout/sessions", self.api_url))
            .map_err(|e| StripeError::RequestFailed(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| StripeError::RequestFailed("API URL cannot be a base".to_string()))?
            .push(session_id);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| StripeError::from_transport(&e))?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, StripeError> {
        match response.status() {
            status if status.is_success() => response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    StripeError::Timeout
                } else {
                    StripeError::ResponseParseFailed(e.to_string())
                }
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(StripeError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(StripeError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
                let message = envelope
                    .as_ref()
                    .and_then(|e| e.error.message.clone())
                    .unwrap_or(body);
                let missing = status == StatusCode::NOT_FOUND
                    || envelope
                        .as_ref()
                        .and_then(|e| e.error.code.as_deref())
                        .is_some_and(|code| code == "resource_missing");

                if missing {
                    tracing::debug!(status = status.as_u16(), "Stripe resource missing");
                    Err(StripeError::NotFound(message))
                } else {
                    Err(StripeError::ApiError {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StripeClient::new("sk_test_123".to_string(), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.secret_key, "sk_test_123");
        assert_eq!(client.api_url, "https://api.stripe.com/v1");
    }

    #[test]
    fn test_api_url_override_trims_trailing_slash() {
        let client = StripeClient::new("sk_test_123".to_string(), DEFAULT_TIMEOUT)
            .unwrap()
            .with_api_url("http://127.0.0.1:9999/v1/");
        assert_eq!(client.api_url(), "http://127.0.0.1:9999/v1");
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let client = StripeClient::new("sk_live_secret".to_string(), DEFAULT_TIMEOUT).unwrap();
        assert!(!format!("{client:?}").contains("sk_live_secret"));
    }
}
