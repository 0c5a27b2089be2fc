//! Wiring configuration into a [`CheckoutService`].
//!
//! | Present in config     | Payments        | Events / tickets     | Ledger     |
//! |-----------------------|-----------------|----------------------|------------|
//! | `STRIPE_SECRET_KEY`   | Stripe          |                      |            |
//! | `SUPABASE_URL` + key  |                 | Supabase             |            |
//! | `DATABASE_URL`        |                 |                      | `PostgreSQL` |
//! | nothing               | mock            | sample events        | memory     |

use crate::config::Config;
use anyhow::Context;
use indieevent_core::{
    CheckoutLedger, CheckoutService, Clock, EventStore, InMemoryCheckoutLedger,
    InMemoryEventStore, InMemoryGateway, InMemoryTicketIssuer, PaymentGateway, StripeGateway,
    SupabaseEventStore, SupabaseTicketIssuer, SystemClock, TicketIssuer,
};
use indieevent_postgres::PostgresCheckoutLedger;
use indieevent_stripe::StripeClient;
use indieevent_supabase::SupabaseClient;
use std::sync::Arc;

/// Build the checkout service from configuration.
///
/// Connects to and migrates the ledger database when one is configured.
///
/// # Errors
///
/// Returns an error if a configured client cannot be built or the database
/// cannot be reached or migrated.
pub async fn build_service(config: &Config) -> anyhow::Result<CheckoutService> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let timeout = config.checkout.upstream_timeout();

    let gateway: Arc<dyn PaymentGateway> = match &config.payments.stripe_secret_key {
        Some(secret_key) => {
            let client = StripeClient::new(secret_key.clone(), timeout)
                .context("building Stripe client")?
                .with_api_url(config.payments.stripe_api_url.clone());
            tracing::info!(api_url = %client.api_url(), "Using Stripe payment gateway");
            StripeGateway::shared(client, config.payments.currency.clone())
        }
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, checkout runs in mock mode");
            InMemoryGateway::shared(Arc::clone(&clock))
        }
    };

    let (events, tickets): (Arc<dyn EventStore>, Arc<dyn TicketIssuer>) =
        match &config.backing_store {
            Some(store) => {
                let client = SupabaseClient::new(&store.url, store.api_key.clone(), timeout)
                    .context("building Supabase client")?;
                tracing::info!(url = %store.url, "Using Supabase for events and tickets");
                (
                    Arc::new(SupabaseEventStore::new(client.clone())),
                    Arc::new(SupabaseTicketIssuer::new(client, Arc::clone(&clock))),
                )
            }
            None => {
                tracing::warn!("Supabase not configured, serving sample events");
                (
                    InMemoryEventStore::shared(),
                    Arc::new(InMemoryTicketIssuer::new(Arc::clone(&clock))),
                )
            }
        };

    let ledger: Arc<dyn CheckoutLedger> = match &config.database {
        Some(database) => {
            let ledger = PostgresCheckoutLedger::connect(&database.url, database.max_connections)
                .await
                .context("connecting to ledger database")?;
            ledger.migrate().await.context("migrating ledger schema")?;
            tracing::info!(
                max_connections = database.max_connections,
                "Using PostgreSQL checkout ledger"
            );
            Arc::new(ledger)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, checkout ledger is in memory");
            InMemoryCheckoutLedger::shared()
        }
    };

    Ok(
        CheckoutService::new(events, gateway, ledger, tickets, clock)
            .with_price_source(config.checkout.price_source),
    )
}
