//! PostgREST client implementation

use crate::{
    error::SupabaseError,
    rows::{EVENT_COLUMNS, EventRow, NewTicketRow, TicketRow},
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default client-side timeout for a single query
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backing-store REST client
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    rest_url: String,
    api_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client from `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`
    /// (falling back to `SUPABASE_ANON_KEY`).
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotConfigured` if the URL or both keys are missing
    pub fn from_env() -> Result<Self, SupabaseError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let url = var("SUPABASE_URL")
            .or_else(|| var("NEXT_PUBLIC_SUPABASE_URL"))
            .ok_or(SupabaseError::NotConfigured("SUPABASE_URL"))?;
        let key = var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|| var("SUPABASE_ANON_KEY"))
            .ok_or(SupabaseError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"))?;

        Self::new(&url, key, DEFAULT_TIMEOUT)
    }

    /// Create a client for a project URL (`https://<ref>.supabase.co`)
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::ClientBuild` if the TLS backend cannot be initialised
    pub fn new(project_url: &str, api_key: String, timeout: Duration) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SupabaseError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Fetch one event by id. `Ok(None)` means no such row.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, timeouts, or query failures
    pub async fn fetch_event(&self, id: &str) -> Result<Option<EventRow>, SupabaseError> {
        let eq = format!("eq.{id}");
        let request = self
            .client
            .get(format!("{}/events", self.rest_url))
            .query(&[("id", eq.as_str()), ("select", EVENT_COLUMNS), ("limit", "1")]);

        let rows: Vec<EventRow> = self.send(request).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a ticket and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, timeouts, or query failures
    pub async fn insert_ticket(&self, ticket: &NewTicketRow) -> Result<TicketRow, SupabaseError> {
        let request = self
            .client
            .post(format!("{}/tickets", self.rest_url))
            .header("Prefer", "return=representation")
            .json(&[ticket]);

        let rows: Vec<TicketRow> = self.send(request).await?;
        rows.into_iter().next().ok_or_else(|| {
            SupabaseError::ResponseParseFailed("insert returned no rows".to_string())
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SupabaseError> {
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| SupabaseError::from_transport(&e))?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| SupabaseError::ResponseParseFailed(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);

        tracing::debug!(status = status.as_u16(), message = %message, "PostgREST query failed");

        Err(SupabaseError::QueryFailed {
            status: status.as_u16(),
            message,
        })
    }
}
