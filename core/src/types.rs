//! Domain types for IndieEvent checkout.
//!
//! Identifiers are opaque, non-empty strings: events and users come from the
//! backing store or the sample catalogue, session ids from the payment
//! provider. Money is held in integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier, rejecting the empty string.
            #[must_use]
            pub fn parse(raw: impl Into<String>) -> Option<Self> {
                let raw = raw.into();
                if raw.is_empty() { None } else { Some(Self(raw)) }
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the raw identifier.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a hosted event (`event-1`, or a backing-store key)
    EventId
);

string_id!(
    /// Identifier of a user; `guest` for unauthenticated purchases
    UserId
);

string_id!(
    /// Payment-provider checkout session id (`cs_...` live, `mock_session_...` mock)
    SessionId
);

string_id!(
    /// Identifier of an issued ticket
    TicketId
);

/// Sentinel user id for purchases made without signing in.
pub const GUEST_USER_ID: &str = "guest";

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Largest dollar amount accepted from the outside world.
pub const MAX_DOLLARS: f64 = 1_000_000_000.0;

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Converts a decimal dollar amount, rounding to the nearest cent.
    ///
    /// Returns `None` for negative, non-finite or absurdly large input.
    #[must_use]
    pub fn try_from_dollars(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() || dollars < 0.0 || dollars > MAX_DOLLARS {
            return None;
        }

        // Bounded above by MAX_DOLLARS * 100 and non-negative.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cents = (dollars * 100.0).round() as u64;
        Some(Self(cents))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount as decimal dollars (for JSON responses)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Event projection
// ============================================================================

/// Read-only projection of a hosted event, as consumed by checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id
    pub id: EventId,
    /// Display title
    pub title: String,
    /// Authoritative ticket price
    pub price: Money,
    /// Hosting user, when known
    pub host_id: Option<UserId>,
}

impl Event {
    /// Title to show on the payment page; falls back for untitled events.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Event Ticket"
        } else {
            &self.title
        }
    }
}

// ============================================================================
// Session status
// ============================================================================

/// Status of a checkout session as reported by the payment provider.
///
/// Transitions (`open → complete`, `open → expired`) happen provider-side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Awaiting payment
    Open,
    /// Paid
    Complete,
    /// Abandoned
    Expired,
}

impl SessionStatus {
    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Complete => "complete",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Ticket status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Paid and valid
    Confirmed,
    /// Awaiting payment
    Pending,
    /// Voided
    Cancelled,
}

impl TicketStatus {
    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the wire representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(Self::Confirmed),
            "pending" => Some(Self::Pending),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A ticket admitting one user to one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id
    pub id: TicketId,
    /// Event admitted to
    pub event_id: EventId,
    /// Holder
    pub user_id: UserId,
    /// Price paid
    pub price: Money,
    /// Purchase time
    pub purchased_at: DateTime<Utc>,
    /// Status
    pub status: TicketStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_reject_empty() {
        assert!(EventId::parse("").is_none());
        assert_eq!(EventId::parse("event-1").unwrap().as_str(), "event-1");
    }

    #[test]
    fn test_money_from_dollars_rounds_to_cents() {
        assert_eq!(Money::try_from_dollars(25.0), Some(Money::from_cents(2500)));
        assert_eq!(Money::try_from_dollars(19.999), Some(Money::from_cents(2000)));
        assert_eq!(Money::try_from_dollars(0.0), Some(Money::ZERO));
    }

    #[test]
    fn test_money_rejects_invalid_amounts() {
        assert_eq!(Money::try_from_dollars(-0.01), None);
        assert_eq!(Money::try_from_dollars(f64::NAN), None);
        assert_eq!(Money::try_from_dollars(f64::INFINITY), None);
        assert_eq!(Money::try_from_dollars(MAX_DOLLARS * 2.0), None);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(70).to_string(), "0.70");
        assert_eq!(Money::from_cents(93_000).to_string(), "930.00");
    }

    #[test]
    fn test_untitled_event_falls_back() {
        let event = Event {
            id: EventId::parse("event-9").unwrap(),
            title: "  ".to_string(),
            price: Money::ZERO,
            host_id: None,
        };
        assert_eq!(event.display_title(), "Event Ticket");
    }

    #[test]
    fn test_session_status_wire_format() {
        let json = serde_json::to_string(&SessionStatus::Complete).unwrap();
        assert_eq!(json, "\"complete\"");
    }
}
