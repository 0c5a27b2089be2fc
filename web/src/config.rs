//! Configuration management for the checkout server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Which payment gateway, event store and ledger get wired in follows from
//! which credentials are present; see [`crate::bootstrap`].

use indieevent_core::PriceSource;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be used
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Payment provider configuration
    pub payments: PaymentsConfig,
    /// Backing store for events and tickets; `None` serves sample data
    pub backing_store: Option<BackingStoreConfig>,
    /// Checkout ledger database; `None` keeps the ledger in memory
    pub database: Option<DatabaseConfig>,
    /// Checkout behaviour
    pub checkout: CheckoutConfig,
    /// Prometheus exporter configuration
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Origin used for redirects when a request carries no `Origin` header
    pub public_base_url: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Payment provider configuration
#[derive(Clone)]
pub struct PaymentsConfig {
    /// Stripe secret key; `None` selects the mock gateway
    pub stripe_secret_key: Option<String>,
    /// Stripe API base URL
    pub stripe_api_url: String,
    /// Charge currency
    pub currency: String,
}

impl fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "<redacted>"))
            .field("stripe_api_url", &self.stripe_api_url)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Backing store (Supabase) configuration
#[derive(Clone)]
pub struct BackingStoreConfig {
    /// Project URL
    pub url: String,
    /// Service-role or anon key
    pub api_key: String,
}

impl fmt::Debug for BackingStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingStoreConfig")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// `PostgreSQL` configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

/// Checkout configuration
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Where the charged amount comes from
    pub price_source: PriceSource,
    /// Client-side timeout for provider and store calls, in seconds
    pub upstream_timeout_secs: u64,
}

impl CheckoutConfig {
    /// Upstream timeout as a `Duration`
    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// Metrics configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to start the Prometheus exporter
    pub enabled: bool,
    /// Exporter host
    pub host: String,
    /// Exporter port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| source(name).filter(|v| !v.trim().is_empty());
        fn parsed<T: std::str::FromStr>(
            var: &impl Fn(&str) -> Option<String>,
            name: &str,
        ) -> Option<T> {
            var(name).and_then(|s| s.trim().parse().ok())
        }

        let backing_store = match (
            var("SUPABASE_URL").or_else(|| var("NEXT_PUBLIC_SUPABASE_URL")),
            var("SUPABASE_SERVICE_ROLE_KEY").or_else(|| var("SUPABASE_ANON_KEY")),
        ) {
            (Some(url), Some(api_key)) => Some(BackingStoreConfig { url, api_key }),
            _ => None,
        };

        let price_source = match var("CHECKOUT_PRICE_SOURCE") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: "CHECKOUT_PRICE_SOURCE",
                reason,
            })?,
            None => PriceSource::Event,
        };

        Ok(Self {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&var, "PORT").unwrap_or(8080),
                public_base_url: var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                shutdown_timeout: parsed(&var, "SHUTDOWN_TIMEOUT").unwrap_or(30),
            },
            payments: PaymentsConfig {
                stripe_secret_key: var("STRIPE_SECRET_KEY"),
                stripe_api_url: var("STRIPE_API_URL")
                    .unwrap_or_else(|| indieevent_stripe::DEFAULT_API_URL.to_string()),
                currency: var("STRIPE_CURRENCY").unwrap_or_else(|| "usd".to_string()),
            },
            backing_store,
            database: var("DATABASE_URL").map(|url| DatabaseConfig {
                url,
                max_connections: parsed(&var, "DATABASE_MAX_CONNECTIONS").unwrap_or(5),
            }),
            checkout: CheckoutConfig {
                price_source,
                upstream_timeout_secs: parsed(&var, "UPSTREAM_TIMEOUT_SECS").unwrap_or(10),
            },
            metrics: MetricsConfig {
                enabled: parsed(&var, "METRICS_ENABLED").unwrap_or(false),
                host: var("METRICS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&var, "METRICS_PORT").unwrap_or(9090),
            },
        })
    }

    /// Address the HTTP server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Address the metrics exporter binds to
    #[must_use]
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.metrics.host, self.metrics.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Config::from_source(move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_select_mock_everything() {
        let config = config(&[]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.server.public_base_url, "http://localhost:3000");
        assert!(config.payments.stripe_secret_key.is_none());
        assert_eq!(config.payments.currency, "usd");
        assert!(config.backing_store.is_none());
        assert!(config.database.is_none());
        assert_eq!(config.checkout.price_source, PriceSource::Event);
        assert_eq!(config.checkout.upstream_timeout(), Duration::from_secs(10));
        assert!(!config.metrics.enabled);
        assert_eq!(config.server.shutdown_timeout, 30);
    }

    #[test]
    fn test_empty_secret_counts_as_unset() {
        let config = config(&[("STRIPE_SECRET_KEY", "")]).unwrap();
        assert!(config.payments.stripe_secret_key.is_none());
    }

    #[test]
    fn test_backing_store_needs_url_and_key() {
        assert!(config(&[("SUPABASE_URL", "https://x.supabase.co")]).unwrap().backing_store.is_none());

        let config = config(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(config.backing_store.unwrap().api_key, "anon");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("PUBLIC_BASE_URL", "https://indieevent.example/"),
            ("DATABASE_URL", "postgres://localhost/indieevent"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("CHECKOUT_PRICE_SOURCE", "client"),
            ("METRICS_ENABLED", "true"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_base_url, "https://indieevent.example");
        assert_eq!(config.database.unwrap().max_connections, 12);
        assert_eq!(config.checkout.price_source, PriceSource::Client);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_unknown_price_source_is_rejected() {
        let err = config(&[("CHECKOUT_PRICE_SOURCE", "cart")]).unwrap_err();
        assert!(err.to_string().contains("CHECKOUT_PRICE_SOURCE"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = config(&[("STRIPE_SECRET_KEY", "sk_live_secret")]).unwrap();
        assert!(!format!("{config:?}").contains("sk_live_secret"));
    }
}
