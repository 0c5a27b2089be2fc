//! Event lookup.
//!
//! [`EventStore`] resolves an event id to the projection checkout needs. The
//! in-memory implementation serves the sample catalogue used when no backing
//! store is configured; the live one lives in
//! [`supabase_store`](crate::supabase_store).

use crate::error::LookupError;
use crate::types::{Event, EventId, Money, UserId};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Event lookup result
pub type LookupResult<T> = Result<T, LookupError>;

/// Resolves events by id.
///
/// Implementations must keep "no such event" ([`LookupError::NotFound`])
/// distinct from storage failures ([`LookupError::Failed`]).
pub trait EventStore: Send + Sync {
    /// Fetch one event
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if no event has this id, or
    /// [`LookupError::Failed`] on storage/transport failure
    fn lookup_event<'a>(&'a self, id: &'a EventId) -> BoxFuture<'a, LookupResult<Event>>;

    /// Short backend name for diagnostics (`memory`, `supabase`)
    fn backend(&self) -> &'static str;
}

/// In-memory event catalogue.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventStore {
    events: Arc<HashMap<EventId, Event>>,
}

impl InMemoryEventStore {
    /// Creates a store holding exactly the given events
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: Arc::new(events.into_iter().map(|e| (e.id.clone(), e)).collect()),
        }
    }

    /// Creates a store seeded with the sample catalogue
    #[must_use]
    pub fn with_sample_events() -> Self {
        Self::new(sample_events())
    }

    /// Creates an Arc-wrapped sample store for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn EventStore> {
        Arc::new(Self::with_sample_events())
    }

    /// Number of events held
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalogue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventStore for InMemoryEventStore {
    fn lookup_event<'a>(&'a self, id: &'a EventId) -> BoxFuture<'a, LookupResult<Event>> {
        Box::pin(async move { self.events.get(id).cloned().ok_or(LookupError::NotFound) })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// The sample catalogue served in mock mode.
#[must_use]
pub fn sample_events() -> Vec<Event> {
    [
        ("event-1", "Startup Pitch Practice", 25, "user-1"),
        ("event-2", "Digital Marketing Masterclass", 50, "user-2"),
        ("event-3", "Fundraising Strategies for Startups", 35, "user-3"),
        ("event-4", "UX Design Workshop", 40, "user-4"),
        ("event-5", "Business Model Innovation", 30, "user-5"),
    ]
    .into_iter()
    .filter_map(|(id, title, dollars, host)| {
        Some(Event {
            id: EventId::parse(id)?,
            title: title.to_string(),
            price: Money::from_cents(dollars * 100),
            host_id: UserId::parse(host),
        })
    })
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_event_lookup() {
        let store = InMemoryEventStore::with_sample_events();
        let id = EventId::parse("event-2").unwrap();

        let event = store.lookup_event(&id).await.unwrap();

        assert_eq!(event.title, "Digital Marketing Masterclass");
        assert_eq!(event.price, Money::from_cents(5000));
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let store = InMemoryEventStore::with_sample_events();
        let id = EventId::parse("event-404").unwrap();

        assert_eq!(store.lookup_event(&id).await, Err(LookupError::NotFound));
    }

    #[test]
    fn test_sample_catalogue_size() {
        assert_eq!(InMemoryEventStore::with_sample_events().len(), 5);
    }
}
