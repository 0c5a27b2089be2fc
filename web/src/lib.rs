//! HTTP surface for IndieEvent checkout.
//!
//! Thin Axum shell over [`indieevent_core::CheckoutService`]: handlers parse
//! the request, call one service operation, and map the result or
//! [`indieevent_core::CheckoutError`] to JSON.
//!
//! # Example
//!
//! ```no_run
//! use indieevent_web::{AppState, Config, bootstrap, build_router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let service = bootstrap::build_service(&config).await?;
//! let router = build_router(AppState::new(service, &config.server.public_base_url));
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use extractors::{CorrelationId, RequestOrigin};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
