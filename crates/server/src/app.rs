use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::relay::Relay;
use crate::routes;

/// Build the full router around a shared relay.
pub fn build_router(relay: Arc<Relay>, cors: CorsLayer) -> Router {
    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Sessions
        .route("/api/session", post(routes::session::create_session))
        .route("/api/session/{session_id}", get(routes::session::get_session))
        // Practice tools
        .route("/api/puzzle", get(routes::puzzles::get_puzzle))
        .route("/api/pgn", post(routes::pgn::import_pgn))
        // Real-time relay
        .route("/ws", get(routes::relay_ws::ws_handler))
        .layer(Extension(relay))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Any origin when `origin` is unset, otherwise exactly that origin.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(origin.parse::<HeaderValue>()?),
        None => AllowOrigin::from(Any),
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}
