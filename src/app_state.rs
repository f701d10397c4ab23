//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::EventBus;
use crate::stream::StreamCatalog;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Stream catalog resolving subscription names.
    pub catalog: Arc<StreamCatalog>,
    /// Sink for connection lifecycle events.
    pub event_bus: EventBus,
    /// Runtime configuration.
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Assembles the state from its parts.
    #[must_use]
    pub fn new(catalog: StreamCatalog, event_bus: EventBus, config: GatewayConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            event_bus,
            config: Arc::new(config),
        }
    }
}
