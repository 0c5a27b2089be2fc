//! Backing-store implementations of [`EventStore`] and [`TicketIssuer`].

use crate::environment::Clock;
use crate::error::{LookupError, TicketIssueError};
use crate::event_store::{EventStore, LookupResult};
use crate::tickets::{NewTicket, TicketIssuer};
use crate::types::{Event, EventId, Money, Ticket, TicketId, TicketStatus, UserId};
use futures::future::BoxFuture;
use indieevent_supabase::{EventRow, NewTicketRow, SupabaseClient, TicketRow};
use std::sync::Arc;

/// Event lookup against the `events` table.
#[derive(Debug, Clone)]
pub struct SupabaseEventStore {
    client: SupabaseClient,
}

impl SupabaseEventStore {
    /// Wrap a configured client
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

fn to_event(row: EventRow) -> LookupResult<Event> {
    let id = EventId::parse(row.id).ok_or_else(|| LookupError::Failed("event row without id".to_string()))?;
    let price = Money::try_from_dollars(row.price)
        .ok_or_else(|| LookupError::Failed(format!("event {id} has invalid price {}", row.price)))?;

    Ok(Event {
        id,
        title: row.title.unwrap_or_default(),
        price,
        host_id: row.host_id.and_then(UserId::parse),
    })
}

impl EventStore for SupabaseEventStore {
    fn lookup_event<'a>(&'a self, id: &'a EventId) -> BoxFuture<'a, LookupResult<Event>> {
        Box::pin(async move {
            match self.client.fetch_event(id.as_str()).await {
                Ok(Some(row)) => to_event(row),
                Ok(None) => Err(LookupError::NotFound),
                Err(e) => {
                    tracing::error!(event_id = %id, error = %e, "Event lookup failed");
                    Err(LookupError::Failed(e.to_string()))
                }
            }
        })
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}

/// Ticket issuer writing to the `tickets` table.
#[derive(Clone)]
pub struct SupabaseTicketIssuer {
    client: SupabaseClient,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SupabaseTicketIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseTicketIssuer")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl SupabaseTicketIssuer {
    /// Wrap a configured client
    #[must_use]
    pub fn new(client: SupabaseClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }
}

fn to_ticket(row: TicketRow) -> Result<Ticket, TicketIssueError> {
    let corrupt = |what: &str| TicketIssueError(format!("stored ticket has invalid {what}"));

    Ok(Ticket {
        id: TicketId::parse(row.id).ok_or_else(|| corrupt("id"))?,
        event_id: EventId::parse(row.event_id).ok_or_else(|| corrupt("event_id"))?,
        user_id: UserId::parse(row.user_id).ok_or_else(|| corrupt("user_id"))?,
        price: Money::try_from_dollars(row.price).ok_or_else(|| corrupt("price"))?,
        purchased_at: row.purchased_at,
        status: TicketStatus::parse(&row.status).ok_or_else(|| corrupt("status"))?,
    })
}

impl TicketIssuer for SupabaseTicketIssuer {
    fn issue(&self, ticket: NewTicket) -> BoxFuture<'_, Result<Ticket, TicketIssueError>> {
        Box::pin(async move {
            let row = NewTicketRow {
                event_id: ticket.event_id.into_inner(),
                user_id: ticket.user_id.into_inner(),
                purchased_at: self.clock.now(),
                price: ticket.price.as_dollars(),
                status: TicketStatus::Confirmed.as_str().to_string(),
            };

            let stored = self.client.insert_ticket(&row).await.map_err(|e| {
                tracing::error!(event_id = %row.event_id, error = %e, "Ticket insert failed");
                TicketIssueError(e.to_string())
            })?;

            to_ticket(stored)
        })
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}
