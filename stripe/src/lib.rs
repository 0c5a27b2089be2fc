//! # Stripe Checkout Client
//!
//! Minimal Rust client for Stripe's hosted Checkout Sessions: create a
//! session for a set of line items and retrieve it later to read its status,
//! total and metadata.
//!
//! ## Example
//!
//! ```no_run
//! use indieevent_stripe::{CreateCheckoutSession, LineItem, StripeClient};
//! use std::collections::BTreeMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client from STRIPE_SECRET_KEY environment variable
//!     let client = StripeClient::from_env()?;
//!
//!     let params = CreateCheckoutSession::new(
//!         vec![LineItem {
//!             currency: "usd".to_string(),
//!             name: "Event Ticket".to_string(),
//!             description: None,
//!             unit_amount: 2500,
//!             quantity: 1,
//!         }],
//!         "https://example.com/success".to_string(),
//!         "https://example.com/cancel".to_string(),
//!         BTreeMap::new(),
//!     );
//!
//!     let session = client.create_checkout_session(&params).await?;
//!     println!("Redirect to: {:?}", session.url);
//!     Ok(())
//! }
//! ```

pub mod checkout;
pub mod client;
pub mod error;

// Re-export main types for convenience
pub use checkout::{
    CHECKOUT_SESSION_ID_PLACEHOLDER, CheckoutSession, CheckoutSessionStatus,
    CreateCheckoutSession, LineItem,
};
pub use client::{API_VERSION, DEFAULT_API_URL, DEFAULT_TIMEOUT, StripeClient};
pub use error::StripeError;
