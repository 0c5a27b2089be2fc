//! Checkout orchestration.
//!
//! [`CheckoutService`] composes the seams into the three user-facing
//! operations:
//!
//! - [`create_session`](CheckoutService::create_session): look up the event,
//!   split the fee, open a session with the gateway and record it locally.
//! - [`verify_session`](CheckoutService::verify_session): re-read a session
//!   from the gateway. Never mutates anything.
//! - [`confirm_purchase`](CheckoutService::confirm_purchase): issue the ticket
//!   for a paid session, at most once per session.
//!
//! Which implementation sits behind each seam is decided once at startup.

use crate::environment::Clock;
use crate::error::{CheckoutError, GatewayError, LookupError};
use crate::event_store::EventStore;
use crate::fees::FeeSplit;
use crate::ledger::{CheckoutLedger, CheckoutRecord};
use crate::payment_gateway::{GatewayMode, NewCheckoutSession, PaymentGateway};
use crate::request::CheckoutRequest;
use crate::tickets::{NewTicket, TicketIssuer};
use crate::types::{Event, EventId, Money, SessionId, SessionStatus, Ticket, UserId};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Where the charged amount comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceSource {
    /// The event's stored price; the client price is only validated
    #[default]
    Event,
    /// The price the client submitted
    Client,
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" => Ok(Self::Event),
            "client" => Ok(Self::Client),
            other => Err(format!("unknown price source '{other}' (expected event|client)")),
        }
    }
}

/// Outcome of a successful session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    /// Provider session id
    pub session_id: SessionId,
    /// Where the client should navigate next
    pub redirect_url: String,
}

/// What verification learned about a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Session id that was verified
    pub session_id: SessionId,
    /// Provider-reported status
    pub status: SessionStatus,
    /// Event the session was opened for
    pub event_id: Option<EventId>,
    /// Purchaser
    pub user_id: Option<UserId>,
    /// Total charged
    pub amount: Option<Money>,
}

/// Which implementation backs each seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceBackends {
    /// Payment gateway mode
    pub payments: GatewayMode,
    /// Event store backend
    pub events: &'static str,
    /// Checkout ledger backend
    pub ledger: &'static str,
    /// Ticket issuer backend
    pub tickets: &'static str,
}

/// Checkout orchestration service.
#[derive(Clone)]
pub struct CheckoutService {
    events: Arc<dyn EventStore>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn CheckoutLedger>,
    tickets: Arc<dyn TicketIssuer>,
    clock: Arc<dyn Clock>,
    price_source: PriceSource,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("backends", &self.backends())
            .field("price_source", &self.price_source)
            .finish_non_exhaustive()
    }
}

impl CheckoutService {
    /// Creates a service charging the event's stored price
    #[must_use]
    pub fn new(
        events: Arc<dyn EventStore>,
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn CheckoutLedger>,
        tickets: Arc<dyn TicketIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            gateway,
            ledger,
            tickets,
            clock,
            price_source: PriceSource::Event,
        }
    }

    /// Override where the charged amount comes from
    #[must_use]
    pub const fn with_price_source(mut self, price_source: PriceSource) -> Self {
        self.price_source = price_source;
        self
    }

    /// Which implementation backs each seam
    #[must_use]
    pub fn backends(&self) -> ServiceBackends {
        ServiceBackends {
            payments: self.gateway.mode(),
            events: self.events.backend(),
            ledger: self.ledger.backend(),
            tickets: self.tickets.backend(),
        }
    }

    /// Resolve an event by raw id.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidRequest`] for an empty id
    /// - [`CheckoutError::EventNotFound`] if no such event exists
    /// - [`CheckoutError::LookupFailed`] if the backing store failed
    pub async fn lookup_event(&self, event_id: &str) -> Result<Event, CheckoutError> {
        let id = EventId::parse(event_id).ok_or_else(|| CheckoutError::invalid("missing eventId"))?;
        self.fetch_event(&id).await
    }

    async fn fetch_event(&self, id: &EventId) -> Result<Event, CheckoutError> {
        match self.events.lookup_event(id).await {
            Ok(event) => Ok(event),
            Err(LookupError::NotFound) => {
                tracing::warn!(event_id = %id, "Event not found");
                Err(CheckoutError::EventNotFound(id.clone()))
            }
            Err(LookupError::Failed(message)) => {
                tracing::error!(event_id = %id, error = %message, "Event lookup failed");
                Err(CheckoutError::LookupFailed(message))
            }
        }
    }

    /// Open a checkout session for a validated request.
    ///
    /// `origin` is the scheme and host the provider redirects back to.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EventNotFound`] / [`CheckoutError::LookupFailed`] from the event lookup;
    ///   the gateway is not called in either case
    /// - [`CheckoutError::ProviderError`] if the gateway fails or returns no redirect
    /// - [`CheckoutError::LedgerFailed`] if the session could not be recorded
    pub async fn create_session(
        &self,
        request: CheckoutRequest,
        origin: &str,
    ) -> Result<SessionResult, CheckoutError> {
        let event = self.fetch_event(&request.event_id).await?;

        if request.price != event.price {
            tracing::warn!(
                event_id = %event.id,
                client_price = request.price.cents(),
                event_price = event.price.cents(),
                price_source = ?self.price_source,
                "Client price differs from event price"
            );
        }
        let amount = match self.price_source {
            PriceSource::Event => event.price,
            PriceSource::Client => request.price,
        };
        let fees = FeeSplit::for_amount(amount);
        let mode = self.gateway.mode();

        let started = Instant::now();
        let created = self
            .gateway
            .create_session(NewCheckoutSession {
                event_id: event.id.clone(),
                event_title: event.display_title().to_string(),
                user_id: request.user_id.clone(),
                amount,
                fees,
                origin: origin.to_string(),
            })
            .await;
        record_provider_duration("create", started);

        let session = match created {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(event_id = %event.id, error = %err, "Checkout session creation failed");
                metrics::counter!("indieevent_checkout_sessions_total", "mode" => mode.as_str(), "outcome" => "error")
                    .increment(1);
                return Err(err.into());
            }
        };

        let redirect_url = session.redirect_url.ok_or_else(|| {
            CheckoutError::ProviderError("checkout session has no redirect URL".to_string())
        })?;

        self.ledger
            .record(CheckoutRecord {
                session_id: session.id.clone(),
                event_id: event.id.clone(),
                user_id: request.user_id,
                amount,
                fees,
                mode,
                created_at: self.clock.now(),
                ticket: None,
            })
            .await
            .map_err(|err| {
                tracing::error!(session_id = %session.id, error = %err, "Failed to record checkout session");
                CheckoutError::from(err)
            })?;

        metrics::counter!("indieevent_checkout_sessions_total", "mode" => mode.as_str(), "outcome" => "created")
            .increment(1);
        metrics::counter!("indieevent_checkout_gross_cents_total").increment(amount.cents());
        metrics::counter!("indieevent_platform_fee_cents_total").increment(fees.platform_fee.cents());

        tracing::info!(
            session_id = %session.id,
            event_id = %event.id,
            amount = amount.cents(),
            platform_fee = fees.platform_fee.cents(),
            host_revenue = fees.host_revenue.cents(),
            mode = mode.as_str(),
            "Checkout session created"
        );

        Ok(SessionResult {
            session_id: session.id,
            redirect_url,
        })
    }

    /// Report a session's status and business context.
    ///
    /// Provider metadata wins; the local ledger fills what the provider did
    /// not echo back. Repeated calls return the same answer unless the
    /// session changed provider-side.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidRequest`] for an empty id, before any call
    /// - [`CheckoutError::SessionNotFound`] if the provider has no such session
    /// - [`CheckoutError::ProviderError`] for other provider failures
    pub async fn verify_session(&self, session_id: &str) -> Result<VerificationResult, CheckoutError> {
        let id =
            SessionId::parse(session_id).ok_or_else(|| CheckoutError::invalid("missing session_id"))?;

        let started = Instant::now();
        let retrieved = self.gateway.retrieve_session(&id).await;
        record_provider_duration("retrieve", started);

        let session = match retrieved {
            Ok(session) => session,
            Err(GatewayError::SessionNotFound) => {
                tracing::warn!(session_id = %id, "Checkout session not found");
                return Err(CheckoutError::SessionNotFound(id));
            }
            Err(err) => {
                tracing::error!(session_id = %id, error = %err, "Checkout session verification failed");
                return Err(err.into());
            }
        };

        let record = match self.ledger.find(&id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(session_id = %id, error = %err, "Checkout ledger unavailable during verification");
                None
            }
        };

        let metadata = session.metadata;
        let provider_event = metadata.event_id.and_then(EventId::parse);
        let provider_user = metadata.user_id.and_then(UserId::parse);

        if let Some(record) = &record {
            let event_differs = provider_event.as_ref().is_some_and(|e| *e != record.event_id);
            let user_differs = provider_user.as_ref().is_some_and(|u| *u != record.user_id);
            if event_differs || user_differs {
                tracing::warn!(
                    session_id = %id,
                    ledger_event_id = %record.event_id,
                    ledger_user_id = %record.user_id,
                    "Provider metadata disagrees with checkout ledger"
                );
            }
        }

        let result = VerificationResult {
            event_id: provider_event.or_else(|| record.as_ref().map(|r| r.event_id.clone())),
            user_id: provider_user.or_else(|| record.as_ref().map(|r| r.user_id.clone())),
            amount: session.amount_total.or_else(|| record.as_ref().map(|r| r.amount)),
            status: session.status,
            session_id: id,
        };

        metrics::counter!("indieevent_checkout_verifications_total", "status" => result.status.as_str())
            .increment(1);
        tracing::info!(
            session_id = %result.session_id,
            status = %result.status,
            amount = result.amount.map(|a| a.cents()),
            "Checkout session verified"
        );

        Ok(result)
    }

    /// Issue the ticket for a paid session.
    ///
    /// A session gets at most one ticket: the ledger keeps the first ticket
    /// attached to it and later confirmations return that ticket.
    ///
    /// # Errors
    ///
    /// - everything [`verify_session`](Self::verify_session) returns
    /// - [`CheckoutError::PaymentIncomplete`] if the session is not `complete`
    /// - [`CheckoutError::EventNotFound`] if the session names an event the
    ///   store does not know; nothing is recorded or issued
    /// - [`CheckoutError::LedgerFailed`] if the ledger cannot be read or written
    /// - [`CheckoutError::TicketIssueFailed`] if the issuer fails or the session
    ///   carries no event/user
    pub async fn confirm_purchase(&self, session_id: &str) -> Result<Ticket, CheckoutError> {
        let verified = self.verify_session(session_id).await?;
        if verified.status != SessionStatus::Complete {
            return Err(CheckoutError::PaymentIncomplete(verified.status));
        }

        let id = verified.session_id;
        let existing = self.ledger.find(&id).await?;
        if let Some(ticket) = existing.as_ref().and_then(|r| r.ticket.clone()) {
            tracing::debug!(session_id = %id, ticket_id = %ticket.id, "Ticket already issued");
            return Ok(ticket);
        }

        let event_id = verified
            .event_id
            .ok_or_else(|| CheckoutError::TicketIssueFailed("session has no event id".to_string()))?;
        let user_id = verified
            .user_id
            .ok_or_else(|| CheckoutError::TicketIssueFailed("session has no user id".to_string()))?;
        let price = verified
            .amount
            .or_else(|| existing.as_ref().map(|r| r.amount))
            .unwrap_or(Money::ZERO);

        let event = self.fetch_event(&event_id).await?;
        let event_id = event.id;

        if existing.is_none() {
            self.ledger
                .record(CheckoutRecord {
                    session_id: id.clone(),
                    event_id: event_id.clone(),
                    user_id: user_id.clone(),
                    amount: price,
                    fees: FeeSplit::for_amount(price),
                    mode: self.gateway.mode(),
                    created_at: self.clock.now(),
                    ticket: None,
                })
                .await?;
        }

        let issued = self
            .tickets
            .issue(NewTicket {
                event_id,
                user_id,
                price,
            })
            .await
            .map_err(|err| {
                tracing::error!(session_id = %id, error = %err, "Ticket issue failed");
                CheckoutError::from(err)
            })?;

        let ticket = match self.ledger.attach_ticket(&id, issued.clone()).await? {
            Some(winner) if winner.id != issued.id => {
                tracing::warn!(
                    session_id = %id,
                    kept = %winner.id,
                    discarded = %issued.id,
                    "Concurrent confirmation; keeping the first ticket"
                );
                winner
            }
            Some(winner) => winner,
            None => issued,
        };

        metrics::counter!("indieevent_tickets_issued_total").increment(1);
        tracing::info!(
            session_id = %id,
            ticket_id = %ticket.id,
            event_id = %ticket.event_id,
            "Ticket issued"
        );

        Ok(ticket)
    }
}

fn record_provider_duration(operation: &'static str, started: Instant) {
    metrics::histogram!("indieevent_provider_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_source_parsing() {
        assert_eq!("event".parse::<PriceSource>().unwrap(), PriceSource::Event);
        assert_eq!(" Client ".parse::<PriceSource>().unwrap(), PriceSource::Client);
        assert!("session".parse::<PriceSource>().is_err());
    }
}
