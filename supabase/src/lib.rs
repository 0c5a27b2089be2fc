//! # Backing-store client
//!
//! Thin PostgREST client for the two tables the checkout flow touches:
//! `events` (read by id) and `tickets` (insert). Authentication uses the
//! project's service-role or anon key, sent both as `apikey` and as a bearer
//! token.

pub mod client;
pub mod error;
pub mod rows;

pub use client::{DEFAULT_TIMEOUT, SupabaseClient};
pub use error::SupabaseError;
pub use rows::{EventRow, NewTicketRow, TicketRow};
