//! `PostgreSQL` checkout ledger for IndieEvent.
//!
//! Persists the business context of every checkout session (event, user,
//! amount, fee split, gateway mode) keyed by session id, so verification does
//! not depend solely on the payment provider echoing metadata back. The same
//! row holds the ticket issued for the session; it is set with a
//! compare-and-set update, which is what keeps ticket issuance at most once
//! per session across server instances.
//!
//! # Example
//!
//! ```no_run
//! use indieevent_postgres::PostgresCheckoutLedger;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = PostgresCheckoutLedger::connect("postgres://localhost/indieevent", 5).await?;
//!     ledger.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ledger;

pub use ledger::{PostgresCheckoutLedger, SCHEMA};
