//! # IndieEvent Testing
//!
//! Test doubles and fixtures for the checkout flow.
//!
//! This crate provides:
//! - Mock implementations of the checkout seams (clock, gateway, store, ledger)
//! - A [`TestHarness`] wiring a [`CheckoutService`] to in-memory parts it can inspect
//! - proptest strategies for prices
//!
//! ## Example
//!
//! ```
//! use indieevent_testing::TestHarness;
//!
//! # async fn demo() {
//! let harness = TestHarness::new();
//! let result = harness.service.verify_session("").await;
//! assert!(result.is_err());
//! assert_eq!(harness.gateway.retrieve_calls(), 0);
//! # }
//! ```

use chrono::{DateTime, Utc};
use indieevent_core::environment::Clock;
use indieevent_core::{
    CheckoutRequest, CheckoutService, EventId, InMemoryCheckoutLedger, InMemoryEventStore,
    InMemoryTicketIssuer, Money, PriceSource, UserId,
};
use std::sync::Arc;

/// Mock implementations of the checkout seams
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use futures::future::BoxFuture;
    use indieevent_core::{
        CheckoutLedger, CheckoutRecord, CheckoutSession, Event, EventId, EventStore,
        GatewayError, GatewayMode, GatewayResult, InMemoryGateway, LedgerError, LedgerResult,
        LookupError, LookupResult, NewCheckoutSession, PaymentGateway, SessionId, Ticket,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use indieevent_testing::mocks::FixedClock;
    /// use indieevent_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Gateway that counts provider calls.
    ///
    /// Delegates to an inner gateway ([`InMemoryGateway`] by default) so the
    /// flow still works end to end.
    pub struct RecordingGateway {
        inner: Arc<dyn PaymentGateway>,
        creates: AtomicUsize,
        retrieves: AtomicUsize,
    }

    impl std::fmt::Debug for RecordingGateway {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RecordingGateway")
                .field("creates", &self.create_calls())
                .field("retrieves", &self.retrieve_calls())
                .finish_non_exhaustive()
        }
    }

    impl RecordingGateway {
        /// Wrap an arbitrary gateway
        #[must_use]
        pub fn wrapping(inner: Arc<dyn PaymentGateway>) -> Self {
            Self {
                inner,
                creates: AtomicUsize::new(0),
                retrieves: AtomicUsize::new(0),
            }
        }

        /// Wrap a mock gateway driven by `clock`
        #[must_use]
        pub fn mock(clock: Arc<dyn Clock>) -> Self {
            Self::wrapping(InMemoryGateway::shared(clock))
        }

        /// Number of `create_session` calls
        #[must_use]
        pub fn create_calls(&self) -> usize {
            self.creates.load(Ordering::SeqCst)
        }

        /// Number of `retrieve_session` calls
        #[must_use]
        pub fn retrieve_calls(&self) -> usize {
            self.retrieves.load(Ordering::SeqCst)
        }

        /// Total provider calls
        #[must_use]
        pub fn total_calls(&self) -> usize {
            self.create_calls() + self.retrieve_calls()
        }
    }

    impl PaymentGateway for RecordingGateway {
        fn create_session(
            &self,
            request: NewCheckoutSession,
        ) -> BoxFuture<'_, GatewayResult<CheckoutSession>> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create_session(request)
        }

        fn retrieve_session<'a>(
            &'a self,
            session_id: &'a SessionId,
        ) -> BoxFuture<'a, GatewayResult<CheckoutSession>> {
            self.retrieves.fetch_add(1, Ordering::SeqCst);
            self.inner.retrieve_session(session_id)
        }

        fn mode(&self) -> GatewayMode {
            self.inner.mode()
        }
    }

    /// Gateway whose every call fails with the same error.
    #[derive(Debug, Clone)]
    pub struct FailingGateway {
        error: GatewayError,
    }

    impl FailingGateway {
        /// Fail with `error`
        #[must_use]
        pub const fn new(error: GatewayError) -> Self {
            Self { error }
        }
    }

    impl PaymentGateway for FailingGateway {
        fn create_session(
            &self,
            _request: NewCheckoutSession,
        ) -> BoxFuture<'_, GatewayResult<CheckoutSession>> {
            let error = self.error.clone();
            Box::pin(async move { Err(error) })
        }

        fn retrieve_session<'a>(
            &'a self,
            _session_id: &'a SessionId,
        ) -> BoxFuture<'a, GatewayResult<CheckoutSession>> {
            let error = self.error.clone();
            Box::pin(async move { Err(error) })
        }

        fn mode(&self) -> GatewayMode {
            GatewayMode::Live
        }
    }

    /// Event store that is always down.
    #[derive(Debug, Clone, Default)]
    pub struct FailingEventStore;

    impl EventStore for FailingEventStore {
        fn lookup_event<'a>(&'a self, _id: &'a EventId) -> BoxFuture<'a, LookupResult<Event>> {
            Box::pin(async { Err(LookupError::Failed("connection refused".to_string())) })
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    /// Ledger that is always down.
    #[derive(Debug, Clone, Default)]
    pub struct FailingLedger;

    impl FailingLedger {
        fn error() -> LedgerError {
            LedgerError::Database("pool timed out".to_string())
        }
    }

    impl CheckoutLedger for FailingLedger {
        fn record(&self, _record: CheckoutRecord) -> BoxFuture<'_, LedgerResult<()>> {
            Box::pin(async { Err(Self::error()) })
        }

        fn find<'a>(
            &'a self,
            _session_id: &'a SessionId,
        ) -> BoxFuture<'a, LedgerResult<Option<CheckoutRecord>>> {
            Box::pin(async { Err(Self::error()) })
        }

        fn attach_ticket<'a>(
            &'a self,
            _session_id: &'a SessionId,
            _ticket: Ticket,
        ) -> BoxFuture<'a, LedgerResult<Option<Ticket>>> {
            Box::pin(async { Err(Self::error()) })
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }
}

/// Test helpers and fixtures
pub mod helpers {
    use super::{
        Arc, CheckoutRequest, CheckoutService, Clock, EventId, InMemoryCheckoutLedger,
        InMemoryEventStore, InMemoryTicketIssuer, Money, PriceSource, UserId,
    };
    use crate::mocks::{RecordingGateway, test_clock};
    use indieevent_core::{CheckoutLedger, CheckoutRecord, EventStore, PaymentGateway, SessionId};

    /// Origin used by tests that do not care about redirects
    pub const TEST_ORIGIN: &str = "http://localhost:3000";

    /// A checkout request for the given ids and whole-dollar price.
    ///
    /// # Panics
    ///
    /// Panics if either id is empty.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn checkout_request(event_id: &str, user_id: &str, dollars: u64) -> CheckoutRequest {
        CheckoutRequest::new(
            EventId::parse(event_id).expect("test event id must be non-empty"),
            UserId::parse(user_id).expect("test user id must be non-empty"),
            Money::from_cents(dollars * 100),
        )
    }

    /// A [`CheckoutService`] wired to inspectable in-memory parts.
    ///
    /// Defaults: sample catalogue, mock gateway wrapped in a
    /// [`RecordingGateway`], empty ledger, in-memory tickets, fixed clock.
    pub struct TestHarness {
        /// Service under test
        pub service: CheckoutService,
        /// Call-counting gateway the service talks to
        pub gateway: Arc<RecordingGateway>,
        /// Ledger the service writes to
        pub ledger: Arc<InMemoryCheckoutLedger>,
        /// Issuer the service writes tickets to
        pub tickets: Arc<InMemoryTicketIssuer>,
    }

    impl TestHarness {
        /// Harness with all defaults
        #[must_use]
        pub fn new() -> Self {
            Self::builder().build()
        }

        /// Start customizing a harness
        #[must_use]
        pub fn builder() -> TestHarnessBuilder {
            TestHarnessBuilder::default()
        }

        /// The ledger entry for a session the service has recorded.
        ///
        /// # Panics
        ///
        /// Panics if the session is not in the inspectable ledger.
        #[allow(clippy::expect_used)]
        pub async fn ledger_record(&self, session_id: &SessionId) -> CheckoutRecord {
            self.ledger
                .find(session_id)
                .await
                .expect("in-memory ledger does not fail")
                .expect("session should have been recorded")
        }
    }

    impl Default for TestHarness {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Builder for [`TestHarness`]
    #[derive(Default)]
    pub struct TestHarnessBuilder {
        events: Option<Arc<dyn EventStore>>,
        inner_gateway: Option<Arc<dyn PaymentGateway>>,
        ledger: Option<Arc<dyn CheckoutLedger>>,
        price_source: PriceSource,
    }

    impl TestHarnessBuilder {
        /// Replace the event store
        #[must_use]
        pub fn events(mut self, events: Arc<dyn EventStore>) -> Self {
            self.events = Some(events);
            self
        }

        /// Replace the gateway the recorder delegates to
        #[must_use]
        pub fn gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
            self.inner_gateway = Some(gateway);
            self
        }

        /// Give the service a different ledger than the inspectable one
        #[must_use]
        pub fn ledger(mut self, ledger: Arc<dyn CheckoutLedger>) -> Self {
            self.ledger = Some(ledger);
            self
        }

        /// Choose where the charged amount comes from
        #[must_use]
        pub const fn price_source(mut self, price_source: PriceSource) -> Self {
            self.price_source = price_source;
            self
        }

        /// Wire everything together
        #[must_use]
        pub fn build(self) -> TestHarness {
            let clock: Arc<dyn Clock> = Arc::new(test_clock());

            let gateway = Arc::new(match self.inner_gateway {
                Some(inner) => RecordingGateway::wrapping(inner),
                None => RecordingGateway::mock(clock.clone()),
            });
            let ledger = Arc::new(InMemoryCheckoutLedger::new());
            let tickets = Arc::new(InMemoryTicketIssuer::new(clock.clone()));
            let service_ledger: Arc<dyn CheckoutLedger> = match self.ledger {
                Some(custom) => custom,
                None => ledger.clone(),
            };

            let service = CheckoutService::new(
                self.events.unwrap_or_else(InMemoryEventStore::shared),
                gateway.clone(),
                service_ledger,
                tickets.clone(),
                clock,
            )
            .with_price_source(self.price_source);

            TestHarness {
                service,
                gateway,
                ledger,
                tickets,
            }
        }
    }

    /// Install a test-writer tracing subscriber; repeated calls are no-ops.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("indieevent=debug")
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
pub mod properties {
    use proptest::prelude::*;

    /// Any valid dollar price with at most two decimals, up to $1M
    pub fn dollar_price() -> impl Strategy<Value = f64> {
        (0u64..100_000_000).prop_map(|cents| {
            #[allow(clippy::cast_precision_loss)]
            let dollars = cents as f64 / 100.0;
            dollars
        })
    }

    /// Prices the checkout core must reject
    pub fn invalid_price() -> impl Strategy<Value = f64> {
        prop_oneof![
            (1u64..100_000_000).prop_map(|cents| {
                #[allow(clippy::cast_precision_loss)]
                let dollars = -(cents as f64) / 100.0;
                dollars
            }),
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
        ]
    }
}

// Re-export commonly used items
pub use helpers::{TEST_ORIGIN, TestHarness, TestHarnessBuilder, checkout_request, init_test_tracing};
pub use mocks::{
    FailingEventStore, FailingGateway, FailingLedger, FixedClock, RecordingGateway, test_clock,
};
