//! stream-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket and system endpoints.

use std::net::SocketAddr;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use stream_gateway::api;
use stream_gateway::app_state::AppState;
use stream_gateway::config::GatewayConfig;
use stream_gateway::domain::EventBus;
use stream_gateway::domain::event_bus::log_domain_events;
use stream_gateway::stream::builtin::default_catalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting stream-gateway");

    // Build domain layer
    let catalog = default_catalog(Duration::from_millis(config.ticker_interval_ms));
    let event_bus = EventBus::new(config.event_bus_capacity);
    let _event_logger = tokio::spawn(log_domain_events(event_bus.clone()));
    tracing::info!(streams = ?catalog.names(), "stream catalog loaded");

    let listen_addr = config.listen_addr;
    let app_state = AppState::new(catalog, event_bus, config);

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
