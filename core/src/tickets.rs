//! Ticket issuance.

use crate::environment::Clock;
use crate::error::TicketIssueError;
use crate::types::{EventId, Money, Ticket, TicketId, TicketStatus, UserId};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A ticket about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Event admitted to
    pub event_id: EventId,
    /// Holder
    pub user_id: UserId,
    /// Price paid
    pub price: Money,
}

/// Writes confirmed tickets for paid sessions.
pub trait TicketIssuer: Send + Sync {
    /// Persist one confirmed ticket
    ///
    /// # Errors
    ///
    /// Returns [`TicketIssueError`] if the ticket could not be stored
    fn issue(&self, ticket: NewTicket) -> BoxFuture<'_, Result<Ticket, TicketIssueError>>;

    /// Short backend name for diagnostics (`memory`, `supabase`)
    fn backend(&self) -> &'static str;
}

/// Ticket issuer that keeps tickets in process memory.
#[derive(Clone)]
pub struct InMemoryTicketIssuer {
    clock: Arc<dyn Clock>,
    issued: Arc<RwLock<Vec<Ticket>>>,
}

impl std::fmt::Debug for InMemoryTicketIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTicketIssuer").finish_non_exhaustive()
    }
}

impl InMemoryTicketIssuer {
    /// Creates an empty issuer
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            issued: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All tickets issued so far, oldest first
    pub async fn issued(&self) -> Vec<Ticket> {
        self.issued.read().await.clone()
    }
}

impl TicketIssuer for InMemoryTicketIssuer {
    fn issue(&self, ticket: NewTicket) -> BoxFuture<'_, Result<Ticket, TicketIssueError>> {
        Box::pin(async move {
            let id = TicketId::parse(format!("ticket-{}", Uuid::new_v4()))
                .ok_or_else(|| TicketIssueError("empty ticket id".to_string()))?;

            let ticket = Ticket {
                id,
                event_id: ticket.event_id,
                user_id: ticket.user_id,
                price: ticket.price,
                purchased_at: self.clock.now(),
                status: TicketStatus::Confirmed,
            };

            self.issued.write().await.push(ticket.clone());
            Ok(ticket)
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::environment::SystemClock;

    #[tokio::test]
    async fn test_issue_confirmed_ticket() {
        let issuer = InMemoryTicketIssuer::new(Arc::new(SystemClock));

        let ticket = issuer
            .issue(NewTicket {
                event_id: EventId::parse("event-3").unwrap(),
                user_id: UserId::parse("user-6").unwrap(),
                price: Money::from_cents(3500),
            })
            .await
            .unwrap();

        assert!(ticket.id.as_str().starts_with("ticket-"));
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert_eq!(issuer.issued().await, vec![ticket]);
    }
}
