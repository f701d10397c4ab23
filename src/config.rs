//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::GatewayError;
use crate::stream::BatchConfig;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Capacity of each connection's outbound frame queue.
    pub outbound_queue_capacity: usize,

    /// Upper bound on the number of items in one `events` batch.
    pub batch_max_items: usize,

    /// Milliseconds a partial batch may wait for more items (0 = flush
    /// whatever is ready).
    pub batch_linger_ms: u64,

    /// Capacity of the domain EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Period of the built-in `ticker` stream, in milliseconds.
    pub ticker_interval_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            outbound_queue_capacity: 1024,
            batch_max_items: 256,
            batch_linger_ms: 0,
            event_bus_capacity: 10_000,
            ticker_interval_ms: 1000,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if `LISTEN_ADDR` is set but
    /// cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| GatewayError::InvalidConfig(format!("LISTEN_ADDR `{raw}`: {e}")))?,
            Err(_) => defaults.listen_addr,
        };

        Ok(Self {
            listen_addr,
            outbound_queue_capacity: parse_env(
                "OUTBOUND_QUEUE_CAPACITY",
                defaults.outbound_queue_capacity,
            ),
            batch_max_items: parse_env("BATCH_MAX_ITEMS", defaults.batch_max_items),
            batch_linger_ms: parse_env("BATCH_LINGER_MS", defaults.batch_linger_ms),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            ticker_interval_ms: parse_env("TICKER_INTERVAL_MS", defaults.ticker_interval_ms),
        })
    }

    /// Batching policy applied to every live subscription.
    #[must_use]
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::new(
            self.batch_max_items,
            Duration::from_millis(self.batch_linger_ms),
        )
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
