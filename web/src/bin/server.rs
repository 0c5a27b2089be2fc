//! IndieEvent checkout server.
//!
//! Serves the checkout API over HTTP. With no credentials configured every
//! backend runs in memory and payments are mocked, which is enough to click
//! through a purchase locally.
//!
//! # Usage
//!
//! ```bash
//! # Mock mode
//! cargo run --bin server
//!
//! # Live mode
//! STRIPE_SECRET_KEY=sk_test_... DATABASE_URL=postgres://... cargo run --bin server
//! ```

use anyhow::Context;
use indieevent_web::{AppState, Config, bootstrap, build_router, metrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,indieevent=debug,sqlx=warn,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    tracing::info!(
        bind = %config.bind_address(),
        public_base_url = %config.server.public_base_url,
        price_source = ?config.checkout.price_source,
        "Configuration loaded"
    );

    if config.metrics.enabled {
        metrics::install_exporter(&config.metrics_address())?;
    }

    let service = bootstrap::build_service(&config).await?;
    tracing::info!(backends = ?service.backends(), "Checkout service ready");

    let router = build_router(AppState::new(service, &config.server.public_base_url));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("binding {}", config.bind_address()))?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    let drain = Arc::new(Notify::new());
    let server = {
        let drain = Arc::clone(&drain);
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { drain.notified().await })
                .await
        })
    };

    shutdown_signal().await;
    drain.notify_one();

    let grace = Duration::from_secs(config.server.shutdown_timeout);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(?grace, "Connections still open after grace period, exiting"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
