//! Prometheus exporter for checkout metrics.
//!
//! The core and ledger crates record through the `metrics` facade; nothing is
//! exported until [`install_exporter`] installs a recorder. Metrics are then
//! served at `http://<addr>/metrics`.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Exporter address did not parse
    #[error("Invalid metrics address {0}")]
    Address(String),
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the global recorder and start the scrape listener.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`MetricsError`] if the address is invalid or a recorder is
/// already installed.
pub fn install_exporter(addr: &str) -> Result<(), MetricsError> {
    let socket: SocketAddr = addr
        .parse()
        .map_err(|_| MetricsError::Address(addr.to_string()))?;

    PrometheusBuilder::new()
        .with_http_listener(socket)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    tracing::info!(%socket, "Metrics available at http://{socket}/metrics");
    Ok(())
}

/// Register descriptions for every checkout metric.
pub fn register_metrics() {
    describe_counter!(
        "indieevent_checkout_sessions_total",
        "Checkout sessions created, by gateway mode and outcome"
    );
    describe_counter!(
        "indieevent_checkout_gross_cents_total",
        "Gross amount of created checkout sessions, in cents"
    );
    describe_counter!(
        "indieevent_platform_fee_cents_total",
        "Platform fee on created checkout sessions, in cents"
    );
    describe_counter!(
        "indieevent_checkout_verifications_total",
        "Checkout session verifications, by session status"
    );
    describe_counter!(
        "indieevent_tickets_issued_total",
        "Tickets issued for confirmed purchases"
    );
    describe_counter!(
        "indieevent_ledger_ticket_conflicts_total",
        "Concurrent confirmations that lost the ticket attach race"
    );
    describe_histogram!(
        "indieevent_provider_duration_seconds",
        "Time spent in payment provider calls, by operation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_address_is_rejected() {
        assert!(matches!(
            install_exporter("not-an-address"),
            Err(MetricsError::Address(_))
        ));
    }

    #[test]
    fn test_register_without_recorder_is_noop() {
        register_metrics();
    }
}
