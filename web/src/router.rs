//! Router configuration.

use crate::handlers::{events, health, llm, purchase};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes
/// - `/api/events...`: catalog and purchases
/// - `/api/llm/...`: natural-language booking
///
/// Every route runs inside the correlation ID middleware and a permissive
/// CORS layer.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/purchase", post(purchase::purchase))
        .route("/llm/parse", post(llm::parse))
        .route("/llm/confirm", post(llm::confirm));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(correlation_id_layer())
        .with_state(state)
}
