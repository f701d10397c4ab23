//! HTTP surface: system endpoints, the WebSocket route, and the OpenAPI
//! document.

pub mod system;

use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(system::health_handler, system::streams_handler),
    components(schemas(system::HealthResponse, system::StreamsResponse)),
    tags((name = "System", description = "Service status and stream catalog"))
)]
pub struct ApiDoc;

/// Builds the complete router: system endpoints plus `GET /ws`.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// the WebSocket handler can see the peer address.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(system::routes())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
