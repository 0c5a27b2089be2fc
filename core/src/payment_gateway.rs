//! Payment gateway seam and its mock implementation.
//!
//! [`PaymentGateway`] is the only way checkout talks to a payment processor.
//! Two implementations exist and one is chosen at startup:
//!
//! - [`InMemoryGateway`]: synthesizes sessions locally, no network. Used when
//!   no provider credentials are configured.
//! - [`StripeGateway`](crate::stripe_gateway::StripeGateway): hosted
//!   checkout through the Stripe API.

use crate::environment::Clock;
use crate::error::GatewayError;
use crate::fees::FeeSplit;
use crate::types::{EventId, Money, SessionId, SessionStatus, UserId};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Event id reported for sessions the mock gateway never created
pub const MOCK_EVENT_ID: &str = "mock-event";

/// User id reported for sessions the mock gateway never created
pub const MOCK_USER_ID: &str = "user-6";

/// Sessions the mock gateway remembers before forgetting the oldest
pub const MOCK_SESSION_CAPACITY: usize = 10_000;

/// Amount reported for sessions the mock gateway never created ($25.00)
pub const MOCK_AMOUNT: Money = Money::from_cents(2500);

/// Which kind of gateway is wired in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// Real provider
    Live,
    /// Local simulation
    Mock,
}

impl GatewayMode {
    /// Label for logs, metrics and the ledger
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }

    /// Parse a stored label
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "live" => Some(Self::Live),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// Everything a gateway needs to open a session for one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckoutSession {
    /// Event being purchased
    pub event_id: EventId,
    /// Title shown on the payment page
    pub event_title: String,
    /// Purchaser
    pub user_id: UserId,
    /// Amount to charge for the single line item
    pub amount: Money,
    /// Revenue split attached as metadata
    pub fees: FeeSplit,
    /// Scheme + host the success/cancel URLs are built on
    pub origin: String,
}

/// Metadata attached at creation and echoed back on retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Event id
    pub event_id: Option<String>,
    /// User id
    pub user_id: Option<String>,
    /// Platform fee in dollars, as text
    pub platform_fee: Option<String>,
    /// Host revenue in dollars, as text
    pub host_revenue: Option<String>,
}

impl SessionMetadata {
    /// Metadata for a new session.
    #[must_use]
    pub fn for_checkout(session: &NewCheckoutSession) -> Self {
        Self {
            event_id: Some(session.event_id.to_string()),
            user_id: Some(session.user_id.to_string()),
            platform_fee: Some(session.fees.platform_fee.to_string()),
            host_revenue: Some(session.fees.host_revenue.to_string()),
        }
    }
}

/// A checkout session as seen through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Provider session id
    pub id: SessionId,
    /// Provider-reported status
    pub status: SessionStatus,
    /// Where to send the client (payment page, or success page in mock mode)
    pub redirect_url: Option<String>,
    /// Total charged, when the provider reports it
    pub amount_total: Option<Money>,
    /// Metadata attached at creation
    pub metadata: SessionMetadata,
}

/// Payment gateway trait
///
/// Abstraction over hosted-checkout processors.
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout session for one ticket
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the provider rejects the request or is unreachable
    fn create_session(
        &self,
        request: NewCheckoutSession,
    ) -> BoxFuture<'_, GatewayResult<CheckoutSession>>;

    /// Re-read a session by id
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if the provider has no such
    /// session, and other variants for provider failures
    fn retrieve_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, GatewayResult<CheckoutSession>>;

    /// Which kind of gateway this is
    fn mode(&self) -> GatewayMode;
}

/// Mock payment gateway (always succeeds for development)
///
/// Sessions it creates are remembered and reported as `complete` with their
/// real metadata. Ids it has never seen get the fixed stub answer
/// ([`MOCK_EVENT_ID`], [`MOCK_USER_ID`], [`MOCK_AMOUNT`]). At most
/// [`MOCK_SESSION_CAPACITY`] sessions are kept; a forgotten id gets the stub.
#[derive(Clone)]
pub struct InMemoryGateway {
    clock: Arc<dyn Clock>,
    sessions: Arc<RwLock<MockSessions>>,
}

#[derive(Debug)]
struct MockSessions {
    capacity: usize,
    by_id: HashMap<SessionId, CheckoutSession>,
    created: VecDeque<SessionId>,
}

impl MockSessions {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            by_id: HashMap::new(),
            created: VecDeque::new(),
        }
    }

    fn remember(&mut self, session: CheckoutSession) {
        while self.created.len() >= self.capacity {
            if let Some(oldest) = self.created.pop_front() {
                self.by_id.remove(&oldest);
            }
        }
        self.created.push_back(session.id.clone());
        self.by_id.insert(session.id.clone(), session);
    }
}

impl std::fmt::Debug for InMemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGateway").finish_non_exhaustive()
    }
}

impl InMemoryGateway {
    /// Creates a new mock payment gateway
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(clock, MOCK_SESSION_CAPACITY)
    }

    /// Creates a mock gateway remembering at most `capacity` sessions
    #[must_use]
    pub fn with_capacity(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            clock,
            sessions: Arc::new(RwLock::new(MockSessions::new(capacity))),
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(clock: Arc<dyn Clock>) -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new(clock))
    }

    /// Number of sessions currently remembered
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.by_id.len()
    }

    fn next_session_id(&self) -> Option<SessionId> {
        SessionId::parse(format!(
            "mock_session_{}_{}",
            self.clock.now().timestamp_millis(),
            Uuid::new_v4().simple()
        ))
    }

    fn stub_session(session_id: &SessionId) -> CheckoutSession {
        CheckoutSession {
            id: session_id.clone(),
            status: SessionStatus::Complete,
            redirect_url: None,
            amount_total: Some(MOCK_AMOUNT),
            metadata: SessionMetadata {
                event_id: Some(MOCK_EVENT_ID.to_string()),
                user_id: Some(MOCK_USER_ID.to_string()),
                platform_fee: None,
                host_revenue: None,
            },
        }
    }
}

/// Same-origin success path carrying the session id.
#[must_use]
pub fn success_path(event_id: &EventId, session_id: &str) -> String {
    format!("/events/{event_id}/purchase/success?session_id={session_id}")
}

impl PaymentGateway for InMemoryGateway {
    fn create_session(
        &self,
        request: NewCheckoutSession,
    ) -> BoxFuture<'_, GatewayResult<CheckoutSession>> {
        Box::pin(async move {
            let id = self
                .next_session_id()
                .ok_or_else(|| GatewayError::Provider("empty mock session id".to_string()))?;

            let session = CheckoutSession {
                redirect_url: Some(success_path(&request.event_id, id.as_str())),
                status: SessionStatus::Complete,
                amount_total: Some(request.amount),
                metadata: SessionMetadata::for_checkout(&request),
                id,
            };

            tracing::info!(
                session_id = %session.id,
                event_id = %request.event_id,
                amount = request.amount.cents(),
                "Mock checkout session created"
            );

            self.sessions.write().await.remember(session.clone());

            Ok(session)
        })
    }

    fn retrieve_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, GatewayResult<CheckoutSession>> {
        Box::pin(async move {
            let known = self.sessions.read().await.by_id.get(session_id).cloned();
            Ok(known.unwrap_or_else(|| Self::stub_session(session_id)))
        })
    }

    fn mode(&self) -> GatewayMode {
        GatewayMode::Mock
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::environment::SystemClock;

    fn ticket_request(event: &str, dollars: u64) -> NewCheckoutSession {
        let amount = Money::from_cents(dollars * 100);
        NewCheckoutSession {
            event_id: EventId::parse(event).unwrap(),
            event_title: "Startup Pitch Practice".to_string(),
            user_id: UserId::parse("user-6").unwrap(),
            amount,
            fees: FeeSplit::for_amount(amount),
            origin: "http://localhost:3000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_session_shape() {
        let gateway = InMemoryGateway::new(Arc::new(SystemClock));

        let session = gateway.create_session(ticket_request("event-1", 25)).await.unwrap();

        assert!(session.id.as_str().starts_with("mock_session_"));
        let url = session.redirect_url.unwrap();
        assert!(url.starts_with("/events/event-1/purchase/success?session_id=mock_session_"));
        assert!(url.ends_with(session.id.as_str()));
        assert_eq!(session.metadata.platform_fee.as_deref(), Some("1.75"));
        assert_eq!(session.metadata.host_revenue.as_deref(), Some("23.25"));
    }

    #[tokio::test]
    async fn test_mock_session_ids_are_unique() {
        let gateway = InMemoryGateway::new(Arc::new(SystemClock));

        let first = gateway.create_session(ticket_request("event-1", 25)).await.unwrap();
        let second = gateway.create_session(ticket_request("event-1", 25)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(gateway.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_retrieve_known_session() {
        let gateway = InMemoryGateway::new(Arc::new(SystemClock));
        let created = gateway.create_session(ticket_request("event-2", 50)).await.unwrap();

        let session = gateway.retrieve_session(&created.id).await.unwrap();

        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.amount_total, Some(Money::from_cents(5000)));
        assert_eq!(session.metadata.event_id.as_deref(), Some("event-2"));
    }

    #[tokio::test]
    async fn test_retrieve_unknown_session_returns_stub() {
        let gateway = InMemoryGateway::new(Arc::new(SystemClock));
        let id = SessionId::parse("mock_session_1700000000000").unwrap();

        let session = gateway.retrieve_session(&id).await.unwrap();

        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.amount_total, Some(MOCK_AMOUNT));
        assert_eq!(session.metadata.user_id.as_deref(), Some(MOCK_USER_ID));
        assert_eq!(session.metadata.event_id.as_deref(), Some(MOCK_EVENT_ID));
    }

    #[tokio::test]
    async fn test_oldest_sessions_are_forgotten_at_capacity() {
        let gateway = InMemoryGateway::with_capacity(Arc::new(SystemClock), 2);

        let first = gateway.create_session(ticket_request("event-1", 25)).await.unwrap();
        let second = gateway.create_session(ticket_request("event-2", 50)).await.unwrap();
        let third = gateway.create_session(ticket_request("event-3", 35)).await.unwrap();

        assert_eq!(gateway.session_count().await, 2);

        let forgotten = gateway.retrieve_session(&first.id).await.unwrap();
        assert_eq!(forgotten.metadata.event_id.as_deref(), Some(MOCK_EVENT_ID));

        let kept = gateway.retrieve_session(&second.id).await.unwrap();
        assert_eq!(kept.metadata.event_id.as_deref(), Some("event-2"));
        let newest = gateway.retrieve_session(&third.id).await.unwrap();
        assert_eq!(newest.amount_total, Some(Money::from_cents(3500)));
    }
}
