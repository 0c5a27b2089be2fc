//! Local record of checkout sessions.
//!
//! Every session the gateway opens is written here with the amount and fee
//! split computed at creation time. The record later carries the ticket
//! issued for the session, which is what makes ticket issuance at-most-once.

use crate::error::LedgerError;
use crate::fees::FeeSplit;
use crate::payment_gateway::GatewayMode;
use crate::types::{EventId, Money, SessionId, Ticket, UserId};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ledger result
pub type LedgerResult<T> = Result<T, LedgerError>;

/// One checkout session as seen locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRecord {
    /// Provider session id
    pub session_id: SessionId,
    /// Event purchased
    pub event_id: EventId,
    /// Purchaser
    pub user_id: UserId,
    /// Amount charged
    pub amount: Money,
    /// Split computed for `amount`
    pub fees: FeeSplit,
    /// Gateway that created the session
    pub mode: GatewayMode,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Ticket issued for this session, once confirmed
    pub ticket: Option<Ticket>,
}

/// Checkout ledger trait
pub trait CheckoutLedger: Send + Sync {
    /// Store a newly created session. Re-recording an existing id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] on storage failure
    fn record(&self, record: CheckoutRecord) -> BoxFuture<'_, LedgerResult<()>>;

    /// Look up a session
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] on storage failure or undecodable data
    fn find<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, LedgerResult<Option<CheckoutRecord>>>;

    /// Attach a ticket unless one is already attached.
    ///
    /// Returns the ticket that ended up on the record: `ticket` if it won,
    /// the previously attached one otherwise. `None` when the session is not
    /// in the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] on storage failure
    fn attach_ticket<'a>(
        &'a self,
        session_id: &'a SessionId,
        ticket: Ticket,
    ) -> BoxFuture<'a, LedgerResult<Option<Ticket>>>;

    /// Short backend name for diagnostics (`memory`, `postgres`)
    fn backend(&self) -> &'static str;
}

/// Ledger held in process memory.
///
/// Grows by one record per session and never evicts: dropping a record would
/// let a confirmed session be confirmed again with a fresh ticket. Meant for
/// development and tests; set `DATABASE_URL` for a durable, bounded-by-disk
/// ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckoutLedger {
    records: Arc<RwLock<HashMap<SessionId, CheckoutRecord>>>,
}

impl InMemoryCheckoutLedger {
    /// Creates an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn CheckoutLedger> {
        Arc::new(Self::new())
    }

    /// Number of recorded sessions
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing has been recorded
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl CheckoutLedger for InMemoryCheckoutLedger {
    fn record(&self, record: CheckoutRecord) -> BoxFuture<'_, LedgerResult<()>> {
        Box::pin(async move {
            self.records
                .write()
                .await
                .entry(record.session_id.clone())
                .or_insert(record);
            Ok(())
        })
    }

    fn find<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, LedgerResult<Option<CheckoutRecord>>> {
        Box::pin(async move { Ok(self.records.read().await.get(session_id).cloned()) })
    }

    fn attach_ticket<'a>(
        &'a self,
        session_id: &'a SessionId,
        ticket: Ticket,
    ) -> BoxFuture<'a, LedgerResult<Option<Ticket>>> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            let Some(record) = records.get_mut(session_id) else {
                return Ok(None);
            };
            Ok(Some(record.ticket.get_or_insert(ticket).clone()))
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
