//! Checkout request parsing and validation.
//!
//! Validation is fail-fast and ordered; the first violated rule decides the
//! message the client receives:
//!
//! 1. body is a JSON object → `bad body`
//! 2. `eventId` non-empty string → `missing eventId`
//! 3. `userId` non-empty string → `missing userId`
//! 4. `price` present and not null → `missing price`
//! 5. `price` a number ≥ 0 → `invalid price`

use crate::error::CheckoutError;
use crate::types::{EventId, Money, UserId};
use serde_json::{Map, Value};

/// A validated request to buy one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Event being purchased
    pub event_id: EventId,
    /// Purchaser (`guest` when signed out)
    pub user_id: UserId,
    /// Price the client submitted
    pub price: Money,
}

impl CheckoutRequest {
    /// Build a request from already-typed parts.
    #[must_use]
    pub const fn new(event_id: EventId, user_id: UserId, price: Money) -> Self {
        Self {
            event_id,
            user_id,
            price,
        }
    }

    /// Parse and validate a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidRequest`] naming the first violated rule.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, CheckoutError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| CheckoutError::invalid("bad body"))?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidRequest`] naming the first violated rule.
    pub fn from_value(value: &Value) -> Result<Self, CheckoutError> {
        let fields = value
            .as_object()
            .ok_or_else(|| CheckoutError::invalid("bad body"))?;

        let event_id = non_empty(fields, "eventId")
            .and_then(EventId::parse)
            .ok_or_else(|| CheckoutError::invalid("missing eventId"))?;

        let user_id = non_empty(fields, "userId")
            .and_then(UserId::parse)
            .ok_or_else(|| CheckoutError::invalid("missing userId"))?;

        let price = match fields.get("price") {
            None | Some(Value::Null) => return Err(CheckoutError::invalid("missing price")),
            Some(price) => price
                .as_f64()
                .and_then(Money::try_from_dollars)
                .ok_or_else(|| CheckoutError::invalid("invalid price"))?,
        };

        Ok(Self::new(event_id, user_id, price))
    }
}

fn non_empty<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(result: Result<CheckoutRequest, CheckoutError>) -> String {
        match result {
            Err(CheckoutError::InvalidRequest(msg)) => msg,
            other => format!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_valid_request() {
        let request = CheckoutRequest::from_value(&json!({
            "eventId": "event-1",
            "userId": "user-6",
            "price": 25
        }))
        .unwrap();

        assert_eq!(request.event_id.as_str(), "event-1");
        assert_eq!(request.user_id.as_str(), "user-6");
        assert_eq!(request.price, Money::from_cents(2500));
    }

    #[test]
    fn test_guest_user_is_accepted() {
        let request = CheckoutRequest::from_value(&json!({
            "eventId": "event-1",
            "userId": "guest",
            "price": 0
        }))
        .unwrap();
        assert_eq!(request.user_id.as_str(), crate::types::GUEST_USER_ID);
    }

    #[test]
    fn test_malformed_body() {
        assert_eq!(message(CheckoutRequest::from_json_slice(b"{not json")), "bad body");
        assert_eq!(message(CheckoutRequest::from_json_slice(b"[1,2]")), "bad body");
    }

    #[test]
    fn test_first_violation_wins() {
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({ "price": -5 }))),
            "missing eventId"
        );
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({ "eventId": "event-1", "price": -5 }))),
            "missing userId"
        );
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({
                "eventId": "event-1",
                "userId": "user-6"
            }))),
            "missing price"
        );
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({
                "eventId": "event-1",
                "userId": "user-6",
                "price": -5
            }))),
            "invalid price"
        );
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({
                "eventId": "",
                "userId": "",
                "price": 10
            }))),
            "missing eventId"
        );
    }

    #[test]
    fn test_null_price_is_missing_not_invalid() {
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({
                "eventId": "event-1",
                "userId": "user-6",
                "price": null
            }))),
            "missing price"
        );
    }

    #[test]
    fn test_non_numeric_price_is_invalid() {
        assert_eq!(
            message(CheckoutRequest::from_value(&json!({
                "eventId": "event-1",
                "userId": "user-6",
                "price": "25"
            }))),
            "invalid price"
        );
    }
}
