//! Revenue split between the platform and the event host.
//!
//! Every ticket sale is divided 7% / 93%. Each share is rounded to the cent
//! independently (half up), so `platform_fee + host_revenue` may differ from
//! the charged amount by at most one cent.
//!
//! [`compute_split`] rounds each share straight from the decimal price;
//! [`FeeSplit::for_amount`] splits an amount already held in cents.

use crate::error::CheckoutError;
use crate::types::Money;
use serde::{Deserialize, Serialize};

/// Platform share of a ticket price
pub const PLATFORM_FEE_RATE: f64 = 0.07;

/// Host share of a ticket price
pub const HOST_REVENUE_RATE: f64 = 0.93;

const PLATFORM_FEE_BPS: u64 = 700;
const HOST_REVENUE_BPS: u64 = 9_300;
const BPS_SCALE: u64 = 10_000;

const _: () = assert!(PLATFORM_FEE_BPS + HOST_REVENUE_BPS == BPS_SCALE);

/// Platform fee and host revenue for one charged amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    /// Marketplace cut
    pub platform_fee: Money,
    /// Event creator's share
    pub host_revenue: Money,
}

impl FeeSplit {
    /// Split an amount that is already in cents.
    #[must_use]
    pub const fn for_amount(amount: Money) -> Self {
        Self {
            platform_fee: share(amount, PLATFORM_FEE_BPS),
            host_revenue: share(amount, HOST_REVENUE_BPS),
        }
    }

    /// Sum of both shares.
    #[must_use]
    pub const fn total(&self) -> Money {
        Money::from_cents(self.platform_fee.cents() + self.host_revenue.cents())
    }
}

const fn share(amount: Money, bps: u64) -> Money {
    Money::from_cents(amount.cents().saturating_mul(bps).saturating_add(BPS_SCALE / 2) / BPS_SCALE)
}

/// Compute the split for a decimal dollar price.
///
/// Each share is `round2(price * rate)` on the unrounded price, so sub-cent
/// prices are not rounded twice.
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidRequest`] for negative or non-finite prices;
/// they are rejected, never clamped.
pub fn compute_split(price: f64) -> Result<FeeSplit, CheckoutError> {
    if Money::try_from_dollars(price).is_none() {
        return Err(CheckoutError::invalid("invalid price"));
    }

    Ok(FeeSplit {
        platform_fee: dollar_share(price, PLATFORM_FEE_RATE),
        host_revenue: dollar_share(price, HOST_REVENUE_RATE),
    })
}

// price is finite, non-negative and at most MAX_DOLLARS.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dollar_share(price: f64, rate: f64) -> Money {
    Money::from_cents((price * rate * 100.0).round() as u64)
}
