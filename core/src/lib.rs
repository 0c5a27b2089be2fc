//! # IndieEvent Checkout Core
//!
//! Ticket checkout for the IndieEvent virtual-events marketplace: validate a
//! purchase request, split the price between platform and host, open a hosted
//! payment session, verify it on return, and issue the ticket once paid.
//!
//! ## Core Concepts
//!
//! - **Event Lookup** ([`EventStore`]): resolves an event id to its title and price
//! - **Fee Split** ([`FeeSplit`]): 7% platform fee, 93% host revenue, per-share rounding
//! - **Payment Gateway** ([`PaymentGateway`]): live Stripe sessions or a local mock
//! - **Checkout Ledger** ([`CheckoutLedger`]): local copy of each session's business context
//! - **Ticket Issuer** ([`TicketIssuer`]): persists the confirmed ticket
//! - **Checkout Service** ([`CheckoutService`]): the operations clients call
//!
//! Every seam is a trait with an in-memory implementation and a live one. The
//! pick is made once at startup and injected as `Arc<dyn Trait>`; business
//! logic never branches on mode.
//!
//! ## Example
//!
//! ```
//! use indieevent_core::{
//!     CheckoutRequest, CheckoutService, InMemoryCheckoutLedger, InMemoryEventStore,
//!     InMemoryGateway, InMemoryTicketIssuer, SessionStatus, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), indieevent_core::CheckoutError> {
//! let clock = Arc::new(SystemClock);
//! let service = CheckoutService::new(
//!     InMemoryEventStore::shared(),
//!     InMemoryGateway::shared(clock.clone()),
//!     InMemoryCheckoutLedger::shared(),
//!     Arc::new(InMemoryTicketIssuer::new(clock.clone())),
//!     clock,
//! );
//!
//! let request = CheckoutRequest::from_json_slice(
//!     br#"{"eventId":"event-1","userId":"user-6","price":25}"#,
//! )?;
//! let session = service.create_session(request, "http://localhost:3000").await?;
//!
//! let verified = service.verify_session(session.session_id.as_str()).await?;
//! assert_eq!(verified.status, SessionStatus::Complete);
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod error;
pub mod event_store;
pub mod fees;
pub mod ledger;
pub mod payment_gateway;
pub mod request;
pub mod service;
pub mod stripe_gateway;
pub mod supabase_store;
pub mod tickets;
pub mod types;

// Re-export commonly used types
pub use environment::{Clock, SystemClock};
pub use error::{CheckoutError, GatewayError, LedgerError, LookupError, TicketIssueError};
pub use event_store::{EventStore, InMemoryEventStore, LookupResult, sample_events};
pub use fees::{FeeSplit, HOST_REVENUE_RATE, PLATFORM_FEE_RATE, compute_split};
pub use ledger::{CheckoutLedger, CheckoutRecord, InMemoryCheckoutLedger, LedgerResult};
pub use payment_gateway::{
    CheckoutSession, GatewayMode, GatewayResult, InMemoryGateway, NewCheckoutSession,
    PaymentGateway, SessionMetadata,
};
pub use request::CheckoutRequest;
pub use service::{
    CheckoutService, PriceSource, ServiceBackends, SessionResult, VerificationResult,
};
pub use stripe_gateway::StripeGateway;
pub use supabase_store::{SupabaseEventStore, SupabaseTicketIssuer};
pub use tickets::{InMemoryTicketIssuer, NewTicket, TicketIssuer};
pub use types::{
    Event, EventId, GUEST_USER_ID, Money, SessionId, SessionStatus, Ticket, TicketId,
    TicketStatus, UserId,
};
