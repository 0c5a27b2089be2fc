//! Row shapes for the `events` and `tickets` tables.
//!
//! Only the columns the checkout flow reads or writes are modelled; the
//! tables carry more.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Columns selected from `events`.
pub const EVENT_COLUMNS: &str = "id,title,price,host_id";

/// A row of the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Primary key
    pub id: String,
    /// Display title; nullable in the schema
    #[serde(default)]
    pub title: Option<String>,
    /// Ticket price in dollars
    pub price: f64,
    /// Hosting user
    #[serde(default)]
    pub host_id: Option<String>,
}

/// Insert payload for `tickets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicketRow {
    /// Event the ticket admits to
    pub event_id: String,
    /// Ticket holder
    pub user_id: String,
    /// Purchase time
    pub purchased_at: DateTime<Utc>,
    /// Price paid in dollars
    pub price: f64,
    /// `confirmed`, `pending` or `cancelled`
    pub status: String,
}

/// A row of the `tickets` table as returned by `Prefer: return=representation`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TicketRow {
    /// Primary key (generated by the database)
    pub id: String,
    /// Event the ticket admits to
    pub event_id: String,
    /// Ticket holder
    pub user_id: String,
    /// Purchase time
    pub purchased_at: DateTime<Utc>,
    /// Price paid in dollars
    pub price: f64,
    /// Ticket status
    pub status: String,
}
