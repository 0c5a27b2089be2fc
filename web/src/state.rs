//! Application state for Axum handlers.

use indieevent_core::CheckoutService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Checkout orchestration
    pub checkout: Arc<CheckoutService>,
    /// Origin used for redirects when a request carries no usable `Origin`
    pub public_base_url: Arc<str>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(checkout: CheckoutService, public_base_url: &str) -> Self {
        Self {
            checkout: Arc::new(checkout),
            public_base_url: Arc::from(public_base_url.trim_end_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
