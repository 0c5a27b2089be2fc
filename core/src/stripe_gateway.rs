//! Live payment gateway backed by Stripe Checkout.

use crate::error::GatewayError;
use crate::payment_gateway::{
    CheckoutSession, GatewayMode, GatewayResult, NewCheckoutSession, PaymentGateway,
    SessionMetadata,
};
use crate::types::{Money, SessionId, SessionStatus};
use futures::future::BoxFuture;
use indieevent_stripe::{
    CHECKOUT_SESSION_ID_PLACEHOLDER, CheckoutSessionStatus, CreateCheckoutSession, LineItem,
    StripeClient, StripeError,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default charge currency
pub const DEFAULT_CURRENCY: &str = "usd";

/// Payment gateway that opens hosted Stripe Checkout sessions.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: StripeClient,
    currency: String,
}

impl StripeGateway {
    /// Wrap a configured client
    #[must_use]
    pub fn new(client: StripeClient, currency: impl Into<String>) -> Self {
        Self {
            client,
            currency: currency.into().to_lowercase(),
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(client: StripeClient, currency: impl Into<String>) -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new(client, currency))
    }

    fn build_params(&self, request: &NewCheckoutSession) -> CreateCheckoutSession {
        let mut metadata = BTreeMap::new();
        let SessionMetadata {
            event_id,
            user_id,
            platform_fee,
            host_revenue,
        } = SessionMetadata::for_checkout(request);
        for (key, value) in [
            ("eventId", event_id),
            ("userId", user_id),
            ("platformFee", platform_fee),
            ("hostRevenue", host_revenue),
        ] {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        let origin = request.origin.trim_end_matches('/');
        CreateCheckoutSession::new(
            vec![LineItem {
                currency: self.currency.clone(),
                name: request.event_title.clone(),
                description: Some(format!("Ticket for {}", request.event_title)),
                unit_amount: request.amount.cents(),
                quantity: 1,
            }],
            format!(
                "{origin}/events/{}/purchase/success?session_id={CHECKOUT_SESSION_ID_PLACEHOLDER}",
                request.event_id
            ),
            format!("{origin}/events/{}", request.event_id),
            metadata,
        )
    }
}

fn to_session(session: indieevent_stripe::CheckoutSession) -> GatewayResult<CheckoutSession> {
    let id = SessionId::parse(session.id)
        .ok_or_else(|| GatewayError::Provider("session without id".to_string()))?;

    let status = match session.status {
        Some(CheckoutSessionStatus::Complete) => SessionStatus::Complete,
        Some(CheckoutSessionStatus::Expired) => SessionStatus::Expired,
        Some(CheckoutSessionStatus::Open) | None => SessionStatus::Open,
    };

    let mut metadata = session.metadata;
    Ok(CheckoutSession {
        id,
        status,
        redirect_url: session.url,
        amount_total: session.amount_total.map(Money::from_cents),
        metadata: SessionMetadata {
            event_id: metadata.remove("eventId"),
            user_id: metadata.remove("userId"),
            platform_fee: metadata.remove("platformFee"),
            host_revenue: metadata.remove("hostRevenue"),
        },
    })
}

impl From<StripeError> for GatewayError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::NotFound(_) => Self::SessionNotFound,
            StripeError::Timeout => Self::Timeout,
            StripeError::ApiError { message, .. } => Self::Provider(message),
            other => Self::Provider(other.to_string()),
        }
    }
}

impl PaymentGateway for StripeGateway {
    fn create_session(
        &self,
        request: NewCheckoutSession,
    ) -> BoxFuture<'_, GatewayResult<CheckoutSession>> {
        Box::pin(async move {
            let params = self.build_params(&request);
            let session = to_session(self.client.create_checkout_session(&params).await?)?;

            if session.redirect_url.is_none() {
                return Err(GatewayError::Provider(
                    "checkout session has no payment URL".to_string(),
                ));
            }

            tracing::info!(
                session_id = %session.id,
                event_id = %request.event_id,
                amount = request.amount.cents(),
                "Stripe checkout session created"
            );
            Ok(session)
        })
    }

    fn retrieve_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, GatewayResult<CheckoutSession>> {
        Box::pin(async move {
            let session = self
                .client
                .retrieve_checkout_session(session_id.as_str())
                .await?;
            to_session(session)
        })
    }

    fn mode(&self) -> GatewayMode {
        GatewayMode::Live
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fees::FeeSplit;
    use crate::types::{EventId, UserId};
    use std::time::Duration;

    fn gateway() -> StripeGateway {
        let client = StripeClient::new("sk_test_123".to_string(), Duration::from_secs(1)).unwrap();
        StripeGateway::new(client, "USD")
    }

    fn request() -> NewCheckoutSession {
        let amount = Money::from_cents(3500);
        NewCheckoutSession {
            event_id: EventId::parse("event-3").unwrap(),
            event_title: "Fundraising Strategies for Startups".to_string(),
            user_id: UserId::parse("user-6").unwrap(),
            amount,
            fees: FeeSplit::for_amount(amount),
            origin: "https://indieevent.example/".to_string(),
        }
    }

    #[test]
    fn test_params_carry_urls_and_metadata() {
        let params = gateway().build_params(&request());

        assert_eq!(
            params.success_url,
            "https://indieevent.example/events/event-3/purchase/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(params.cancel_url, "https://indieevent.example/events/event-3");
        assert_eq!(params.metadata["eventId"], "event-3");
        assert_eq!(params.metadata["userId"], "user-6");
        assert_eq!(params.metadata["platformFee"], "2.45");
        assert_eq!(params.metadata["hostRevenue"], "32.55");

        let item = &params.line_items[0];
        assert_eq!(item.currency, "usd");
        assert_eq!(item.unit_amount, 3500);
        assert_eq!(item.quantity, 1);
        assert_eq!(
            item.description.as_deref(),
            Some("Ticket for Fundraising Strategies for Startups")
        );
    }

    #[test]
    fn test_not_found_maps_to_session_not_found() {
        let err: GatewayError = StripeError::NotFound("cs_missing".to_string()).into();
        assert_eq!(err, GatewayError::SessionNotFound);
    }

    #[test]
    fn test_api_error_keeps_provider_message() {
        let err: GatewayError = StripeError::ApiError {
            status: 400,
            message: "Invalid currency".to_string(),
        }
        .into();
        assert_eq!(err, GatewayError::Provider("Invalid currency".to_string()));
    }
}
