//! Checkout Session request and response types.
//!
//! Stripe accepts form-encoded bodies with bracketed keys for nested values
//! (`line_items[0][price_data][unit_amount]=2500`). [`CreateCheckoutSession::to_form`]
//! flattens the typed request into that shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder Stripe substitutes with the real session id in `success_url`.
pub const CHECKOUT_SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Parameters for `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSession {
    /// Line items to charge
    pub line_items: Vec<LineItem>,
    /// Where Stripe sends the customer after payment
    pub success_url: String,
    /// Where Stripe sends the customer if they abandon checkout
    pub cancel_url: String,
    /// Key/value pairs echoed back on retrieval
    pub metadata: BTreeMap<String, String>,
}

/// A single priced line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// ISO currency code, lowercase
    pub currency: String,
    /// Product name shown on the hosted page
    pub name: String,
    /// Product description shown on the hosted page
    pub description: Option<String>,
    /// Price per unit in the currency's minor unit
    pub unit_amount: u64,
    /// Number of units
    pub quantity: u32,
}

impl CreateCheckoutSession {
    /// Create a one-off card payment session for the given items.
    #[must_use]
    pub const fn new(
        line_items: Vec<LineItem>,
        success_url: String,
        cancel_url: String,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            line_items,
            success_url,
            cancel_url,
            metadata,
        }
    }

    /// Flatten into Stripe's bracketed form encoding.
    #[must_use]
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        for (index, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{index}]");
            form.push((
                format!("{prefix}[price_data][currency]"),
                item.currency.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(description) = &item.description {
                form.push((
                    format!("{prefix}[price_data][product_data][description]"),
                    description.clone(),
                ));
            }
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }

        for (key, value) in &self.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        form
    }
}

/// Lifecycle state of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutSessionStatus {
    /// Created, customer has not paid yet
    Open,
    /// Payment succeeded
    Complete,
    /// Abandoned and no longer payable
    Expired,
}

impl fmt::Display for CheckoutSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Complete => write!(f, "complete"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// The subset of the Checkout Session object this client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Session id (`cs_...`)
    pub id: String,
    /// Session status; absent on very old API versions
    #[serde(default)]
    pub status: Option<CheckoutSessionStatus>,
    /// Hosted payment page URL; null once the session is complete or expired
    #[serde(default)]
    pub url: Option<String>,
    /// Total charged, in minor units
    #[serde(default)]
    pub amount_total: Option<u64>,
    /// Currency of `amount_total`
    #[serde(default)]
    pub currency: Option<String>,
    /// Payment status (`paid`, `unpaid`, `no_payment_required`)
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Metadata attached at creation
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ApiErrorBody,
}

/// Body of [`ErrorEnvelope`].
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<String>,
}
