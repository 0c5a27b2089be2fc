//! HTTP request handlers.

pub mod checkout;
pub mod events;
pub mod health;

pub use checkout::{confirm_checkout, create_checkout, verify_checkout};
pub use events::get_event;
pub use health::{health_check, readiness_check};
